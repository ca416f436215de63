//! Dynamic variables: `{{$guid}}`, `{{$randomInt}}`...
//!
//! Generators are looked up by name before the scope chain. The registry
//! comes with the usual Postman generators and accepts custom ones.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

type Generator = Box<dyn Fn() -> String + Send + Sync>;

const FIRST_NAMES: [&str; 8] = [
    "Ada", "Alan", "Grace", "Linus", "Margaret", "Dennis", "Barbara", "Ken",
];
const LAST_NAMES: [&str; 8] = [
    "Lovelace", "Turing", "Hopper", "Torvalds", "Hamilton", "Ritchie", "Liskov", "Thompson",
];
const WORDS: [&str; 8] = [
    "alpha", "bridge", "cobalt", "delta", "ember", "falcon", "granite", "harbor",
];
const ABBREVIATIONS: [&str; 8] = ["SQL", "PCI", "JSON", "HTTP", "XML", "RSS", "SMTP", "TCP"];
const COLORS: [&str; 8] = [
    "red", "green", "blue", "orange", "purple", "teal", "yellow", "magenta",
];
const DOMAINS: [&str; 4] = ["com", "net", "org", "io"];
const ALPHANUMERIC: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Registry of dynamic variable generators.
///
/// # Example
///
/// ```rust
/// use harspec_core::DynamicGenerators;
///
/// let generators = DynamicGenerators::seeded(42).with_generator("$tenant", || "acme".to_string());
///
/// assert_eq!(generators.generate("$tenant").as_deref(), Some("acme"));
/// assert!(generators.generate("$randomInt").is_some_and(|value| value.parse::<u32>().is_ok()));
/// assert_eq!(generators.generate("baseUrl"), None);
/// ```
pub struct DynamicGenerators {
    generators: IndexMap<String, Generator>,
}

impl fmt::Debug for DynamicGenerators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicGenerators")
            .field("generators", &self.generators.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for DynamicGenerators {
    /// Built-in generators, seeded from entropy.
    fn default() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl DynamicGenerators {
    /// Built-in generators with a reproducible random sequence.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    /// A registry without any generator.
    pub fn empty() -> Self {
        Self {
            generators: IndexMap::new(),
        }
    }

    fn with_rng(rng: StdRng) -> Self {
        let rng = Arc::new(Mutex::new(rng));
        let mut result = Self::empty();

        let register = |result: &mut Self, name: &str, generate: fn(&mut StdRng) -> String| {
            let rng = Arc::clone(&rng);
            result.generators.insert(
                name.to_string(),
                Box::new(move || {
                    let mut rng = rng.lock().unwrap_or_else(PoisonError::into_inner);
                    generate(&mut rng)
                }),
            );
        };

        register(&mut result, "$guid", |rng| uuid_from(rng).to_string());
        register(&mut result, "$randomUUID", |rng| uuid_from(rng).to_string());
        register(&mut result, "$timestamp", |_| Utc::now().timestamp().to_string());
        register(&mut result, "$isoTimestamp", |_| {
            Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
        });
        register(&mut result, "$randomInt", |rng| rng.gen_range(0..=1000).to_string());
        register(&mut result, "$randomBoolean", |rng| rng.gen_bool(0.5).to_string());
        register(&mut result, "$randomAlphaNumeric", |rng| pick_char(rng).to_string());
        register(&mut result, "$randomAbbreviation", |rng| pick(rng, &ABBREVIATIONS));
        register(&mut result, "$randomColor", |rng| pick(rng, &COLORS));
        register(&mut result, "$randomHexColor", |rng| {
            format!("#{:06x}", rng.gen_range(0..=0x00ff_ffff_u32))
        });
        register(&mut result, "$randomFirstName", |rng| pick(rng, &FIRST_NAMES));
        register(&mut result, "$randomLastName", |rng| pick(rng, &LAST_NAMES));
        register(&mut result, "$randomEmail", |rng| {
            let first = pick(rng, &FIRST_NAMES).to_lowercase();
            let last = pick(rng, &LAST_NAMES).to_lowercase();
            format!("{first}.{last}@example.{}", pick(rng, &DOMAINS))
        });
        register(&mut result, "$randomWord", |rng| pick(rng, &WORDS));
        register(&mut result, "$randomIP", |rng| {
            let [first, second, third, fourth]: [u8; 4] = rng.r#gen();
            format!("{first}.{second}.{third}.{fourth}")
        });
        register(&mut result, "$randomUrl", |rng| {
            format!("https://{}.{}", pick(rng, &WORDS), pick(rng, &DOMAINS))
        });
        register(&mut result, "$randomPhoneNumber", |rng| {
            format!(
                "{:03}-{:03}-{:04}",
                rng.gen_range(200..1000),
                rng.gen_range(0..1000),
                rng.gen_range(0..10000)
            )
        });

        result
    }

    /// Registers (or replaces) a generator.
    pub fn with_generator<F>(mut self, name: impl Into<String>, generator: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.generators.insert(name.into(), Box::new(generator));
        self
    }

    /// Whether a generator is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.generators.contains_key(name)
    }

    /// Generates a new value, `None` for unknown names.
    pub fn generate(&self, name: &str) -> Option<String> {
        self.generators.get(name).map(|generate| generate())
    }

    /// The registered names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.generators.keys().map(String::as_str)
    }
}

fn uuid_from(rng: &mut StdRng) -> Uuid {
    uuid::Builder::from_random_bytes(rng.r#gen()).into_uuid()
}

fn pick(rng: &mut StdRng, values: &[&str]) -> String {
    values.choose(rng).copied().unwrap_or_default().to_string()
}

fn pick_char(rng: &mut StdRng) -> char {
    ALPHANUMERIC
        .choose(rng)
        .map_or('a', |byte| char::from(*byte))
}

#[cfg(test)]
mod tests {
    use regex::Regex;

    use super::*;

    #[test]
    fn should_register_builtin_generators() {
        let generators = DynamicGenerators::default();

        insta::assert_snapshot!(generators.names().collect::<Vec<_>>().join(" "), @"$guid $randomUUID $timestamp $isoTimestamp $randomInt $randomBoolean $randomAlphaNumeric $randomAbbreviation $randomColor $randomHexColor $randomFirstName $randomLastName $randomEmail $randomWord $randomIP $randomUrl $randomPhoneNumber");
    }

    #[test]
    fn should_generate_expected_shapes() {
        let generators = DynamicGenerators::default();
        let cases = [
            ("$guid", r"^[0-9a-f]{8}-[0-9a-f]{4}-4[0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$"),
            ("$randomInt", r"^\d{1,4}$"),
            ("$randomBoolean", r"^(true|false)$"),
            ("$randomAbbreviation", r"^[A-Z]+$"),
            ("$randomHexColor", r"^#[0-9a-f]{6}$"),
            ("$randomIP", r"^\d{1,3}(\.\d{1,3}){3}$"),
            ("$randomEmail", r"^[a-z]+\.[a-z]+@example\.[a-z]+$"),
            ("$timestamp", r"^\d+$"),
            ("$randomPhoneNumber", r"^\d{3}-\d{3}-\d{4}$"),
        ];

        for (name, pattern) in cases {
            let value = generators.generate(name).expect("a registered generator");
            let regex = Regex::new(pattern).expect("a valid regex");
            assert!(regex.is_match(&value), "{name} generated {value}");
        }
    }

    #[test]
    fn should_reproduce_seeded_sequences() {
        let first = DynamicGenerators::seeded(7);
        let second = DynamicGenerators::seeded(7);

        let first = (0..5).filter_map(|_| first.generate("$randomInt")).collect::<Vec<_>>();
        let second = (0..5).filter_map(|_| second.generate("$randomInt")).collect::<Vec<_>>();

        assert_eq!(first, second);
    }

    #[test]
    fn should_replace_generator() {
        let generators = DynamicGenerators::seeded(1).with_generator("$randomInt", || "7".to_string());

        assert_eq!(generators.generate("$randomInt").as_deref(), Some("7"));
    }
}
