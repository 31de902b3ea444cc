//! Property-based tests for invariants that must hold for any input: comparator
//! permutation invariance and idempotence, similarity bounds, and type-mapping
//! stability.

use proptest::prelude::*;

use shapetrace_analysis::compare::{
    compare_schemas, levenshtein, similarity, CompareOptions, Direction, TraceResult,
};
use shapetrace_analysis::schema::{
    normalize_type_name, ArgumentValue, ConsumerSchema, NormalizedSchema, NormalizedType,
    ProducerSchema, PropertyDef, SchemaRef, SourceFormat,
};
use shapetrace_core::SourceLocation;

// ─── Strategies ────────────────────────────────────────────────────────────

const TOOLS: &[&str] = &["get_user", "list_users", "create_user", "delete_user"];
const KEYS: &[&str] = &["id", "email", "emial", "name", "userName", "username", "limit", "cursor"];

fn tool() -> impl Strategy<Value = String> {
    prop::sample::select(TOOLS).prop_map(str::to_string)
}

fn keys() -> impl Strategy<Value = Vec<(String, bool)>> {
    prop::collection::vec((prop::sample::select(KEYS), any::<bool>()), 0..5)
        .prop_map(|v| v.into_iter().map(|(k, req)| (k.to_string(), req)).collect())
}

fn schema(keys: &[(String, bool)]) -> NormalizedSchema {
    let mut schema = NormalizedSchema::new(SchemaRef::new("prop", "x"));
    for (key, required) in keys {
        let def = PropertyDef::new(NormalizedType::string());
        schema.insert_property(key.clone(), if *required { def } else { def.optional() });
    }
    schema
}

fn producers() -> impl Strategy<Value = Vec<ProducerSchema>> {
    // Few distinct lines, so same-named producers often share a location.
    prop::collection::vec((tool(), keys(), keys(), 1u32..3), 0..6).prop_map(|raw| {
        raw.into_iter()
            .map(|(tool_name, input, output, line)| ProducerSchema {
                tool_name,
                input_schema: schema(&input),
                output_schema: schema(&output),
                location: SourceLocation::new("server.ts", line, 1),
            })
            .collect()
    })
}

fn consumers() -> impl Strategy<Value = Vec<ConsumerSchema>> {
    let reads = prop::collection::vec(prop::sample::select(KEYS), 0..4);
    prop::collection::vec((tool(), keys(), reads), 0..6).prop_map(|raw| {
        raw.into_iter()
            .enumerate()
            .map(|(i, (tool_name, args, reads))| ConsumerSchema {
                tool_name,
                call_site: SourceLocation::new("client.ts", i as u32 + 1, 1),
                arguments_provided: args
                    .into_iter()
                    .map(|(k, _)| (k, ArgumentValue::Placeholder("v".into())))
                    .collect(),
                expected_properties: reads.into_iter().map(str::to_string).collect(),
            })
            .collect()
    })
}

fn direction() -> impl Strategy<Value = Direction> {
    prop_oneof![
        Just(Direction::ProducerToConsumer),
        Just(Direction::ConsumerToProducer),
        Just(Direction::Bidirectional),
    ]
}

/// Order-insensitive rendering of a result.
fn multiset(result: &TraceResult) -> (Vec<String>, Vec<String>) {
    let render = |v: serde_json::Value| v.to_string();
    let mut mismatches: Vec<String> = result
        .mismatches
        .iter()
        .map(|m| render(serde_json::to_value(m).unwrap()))
        .collect();
    let mut matches: Vec<String> = result
        .matches
        .iter()
        .map(|m| render(serde_json::to_value(m).unwrap()))
        .collect();
    mismatches.sort();
    matches.sort();
    (mismatches, matches)
}

// ─── Comparator ────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn compare_is_permutation_invariant(
        (producers, shuffled_producers) in producers().prop_flat_map(|p| (Just(p.clone()), Just(p).prop_shuffle())),
        (consumers, shuffled_consumers) in consumers().prop_flat_map(|c| (Just(c.clone()), Just(c).prop_shuffle())),
        direction in direction(),
    ) {
        let options = CompareOptions::new(direction);
        let a = compare_schemas(&producers, &consumers, &options);
        let b = compare_schemas(&shuffled_producers, &shuffled_consumers, &options);
        prop_assert_eq!(multiset(&a), multiset(&b));
    }

    #[test]
    fn compare_is_idempotent(
        producers in producers(),
        consumers in consumers(),
        direction in direction(),
    ) {
        let options = CompareOptions::new(direction);
        let first = compare_schemas(&producers, &consumers, &options);
        let second = compare_schemas(&producers, &consumers, &options);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn every_consumer_is_accounted_for(
        producers in producers(),
        consumers in consumers(),
        direction in direction(),
    ) {
        let result = compare_schemas(&producers, &consumers, &CompareOptions::new(direction));
        for consumer in &consumers {
            let matched = result.matches.iter().any(|m| m.consumer_usage == consumer.call_site);
            let mismatched = result
                .mismatches
                .iter()
                .any(|m| m.consumer_usage.as_ref() == Some(&consumer.call_site));
            prop_assert!(matched != mismatched);
        }
    }

    #[test]
    fn consumer_to_producer_never_reports_extras(
        producers in producers(),
        consumers in consumers(),
    ) {
        let result = compare_schemas(
            &producers,
            &consumers,
            &CompareOptions::new(Direction::ConsumerToProducer),
        );
        prop_assert!(result.mismatches.iter().all(|m| !m.description.starts_with("Unknown argument")));
        prop_assert!(result.mismatches.iter().all(|m| !m.description.starts_with("Expected property")));
    }
}

// ─── Similarity ────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn levenshtein_is_a_metric(a in "[a-zA-Z_]{0,12}", b in "[a-zA-Z_]{0,12}") {
        let d = levenshtein(&a, &b);
        prop_assert_eq!(d, levenshtein(&b, &a));
        prop_assert_eq!(d == 0, a == b);
        prop_assert!(d <= a.chars().count().max(b.chars().count()));
    }

    #[test]
    fn similarity_is_bounded(a in "[a-z]{0,12}", b in "[a-z]{0,12}") {
        let s = similarity(&a, &b);
        prop_assert!((0.0..=1.0).contains(&s));
        prop_assert_eq!(s == 1.0, a == b);
    }
}

// ─── Type mapping ──────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn type_mapping_is_total_and_stable(raw in "[A-Za-z_\\[\\]<>|(). 0-9*!]{0,24}") {
        for format in SourceFormat::ALL {
            let first = normalize_type_name(format, &raw);
            prop_assert_eq!(first, normalize_type_name(format, &raw));
        }
    }
}
