use criterion::{Criterion, criterion_group, criterion_main};
use harspec_core::postman::{EnvVariableParser, LexicalScope, Variable, VariableParser};
use harspec_core::{Converter, DynamicGenerators, sample};
use serde_json::{Value, json};
use std::hint::black_box;

fn document(paths: usize) -> Value {
    let paths = (0..paths)
        .map(|index| {
            let operation = json!({
                "parameters": [
                    { "name": "id", "in": "path", "required": true, "schema": { "type": "integer", "minimum": 1 } },
                    { "name": "tags", "in": "query", "schema": { "type": "array", "items": { "type": "string" } } },
                    { "name": "X-Trace", "in": "header", "schema": { "type": "string", "format": "uuid" } }
                ],
                "requestBody": {
                    "content": {
                        "application/json": {
                            "schema": {
                                "type": "object",
                                "properties": {
                                    "name": { "type": "string", "minLength": 3 },
                                    "price": { "type": "number", "minimum": 0.5, "multipleOf": 0.25 }
                                }
                            }
                        }
                    }
                }
            });
            (format!("/resources{index}/{{id}}"), json!({ "put": operation }))
        })
        .collect::<serde_json::Map<_, _>>();

    json!({
        "openapi": "3.0.3",
        "servers": [{ "url": "https://bench.test" }],
        "paths": paths
    })
}

fn benchmark_sampling(c: &mut Criterion) {
    let mut group = c.benchmark_group("sampling");

    let cases = [
        ("integer", json!({ "type": "integer", "minimum": 10, "exclusiveMinimum": true })),
        ("decimal_multiple", json!({ "type": "number", "minimum": -20, "multipleOf": 13.3 })),
        ("pattern", json!({ "type": "string", "pattern": "^[A-Z]{3}-\\d{4}$" })),
        (
            "object",
            json!({
                "type": "object",
                "properties": {
                    "id": { "type": "string", "format": "uuid" },
                    "tags": { "type": "array", "items": { "type": "string" }, "minItems": 3 }
                }
            }),
        ),
    ];

    for (name, schema) in &cases {
        group.bench_function(*name, |b| b.iter(|| black_box(sample(black_box(schema)))));
    }

    group.finish();
}

fn benchmark_variables(c: &mut Criterion) {
    let generators = DynamicGenerators::seeded(7);
    let parser = EnvVariableParser::new(&generators);
    let scope = LexicalScope::new(
        "env",
        &[
            Variable::new("baseUrl", "https://{{hostname}}/{{path}}"),
            Variable::new("hostname", "{{companyName}}.{{domainTld}}"),
            Variable::new("path", "api/v1"),
            Variable::new("companyName", "test"),
            Variable::new("domainTld", "com"),
        ],
    );

    c.bench_function("nested_variables", |b| {
        b.iter(|| black_box(parser.parse(black_box("{{baseUrl}}/items/{{$randomInt}}"), &scope)))
    });
}

fn benchmark_conversion(c: &mut Criterion) {
    let mut group = c.benchmark_group("conversion");
    let converter = Converter::default();

    for paths in [1, 10, 100] {
        let document = document(paths);
        group.bench_function(format!("oas3_{paths}_paths"), |b| {
            b.iter(|| black_box(converter.convert(black_box(&document))))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_sampling,
    benchmark_variables,
    benchmark_conversion
);
criterion_main!(benches);
