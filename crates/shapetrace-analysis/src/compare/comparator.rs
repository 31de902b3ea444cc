//! Direction-aware producer/consumer comparison.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use rustc_hash::FxHashMap;

use crate::schema::{ConsumerSchema, NormalizedSchema, NormalizedType, ProducerSchema};

use super::similarity::TypoDetector;
use super::types::{CompareOptions, IssueType, Match, Mismatch, TraceResult};

/// Compare every consumer against the producer of the same tool name.
///
/// Never fails on data: every disagreement becomes a [`Mismatch`]. Consumers are
/// reported in input order. When several producers share a name, the one with the
/// smallest source location is used.
pub fn compare_schemas(
    producers: &[ProducerSchema],
    consumers: &[ConsumerSchema],
    options: &CompareOptions,
) -> TraceResult {
    let index = index_producers(producers);
    let typos = TypoDetector::new(options.similarity_threshold, options.max_edit_distance);
    let mut result = TraceResult::default();

    for consumer in consumers {
        let Some(producer) = index.get(consumer.tool_name.as_str()) else {
            result.mismatches.push(Mismatch {
                tool_name: consumer.tool_name.clone(),
                issue_type: IssueType::UnknownTool,
                description: format!("Unknown tool \"{}\"", consumer.tool_name),
                producer_definition: None,
                consumer_usage: Some(consumer.call_site.clone()),
                suggestion: None,
            });
            continue;
        };

        let mut found = check_arguments(producer, consumer, options, &typos);
        if options.direction.checks_response() {
            found.extend(check_response(producer, consumer, &typos));
        }

        if found.is_empty() {
            result.matches.push(Match {
                tool_name: consumer.tool_name.clone(),
                producer_definition: producer.location.clone(),
                consumer_usage: consumer.call_site.clone(),
            });
        } else {
            result.mismatches.extend(found);
        }
    }

    tracing::debug!(
        producers = producers.len(),
        consumers = consumers.len(),
        direction = %options.direction,
        matches = result.matches.len(),
        mismatches = result.mismatches.len(),
        "schema comparison complete"
    );
    result
}

fn index_producers(producers: &[ProducerSchema]) -> FxHashMap<&str, &ProducerSchema> {
    let mut index: FxHashMap<&str, &ProducerSchema> = FxHashMap::default();
    for producer in producers {
        index
            .entry(producer.tool_name.as_str())
            .and_modify(|current| {
                if precedes(producer, current) {
                    *current = producer;
                }
            })
            .or_insert(producer);
    }
    index
}

/// Total order among same-named producers, so the winner does not depend on input order.
/// Location decides first, then property names, then the full serialized shapes.
fn precedes(a: &ProducerSchema, b: &ProducerSchema) -> bool {
    let keys = |p: &ProducerSchema| -> Vec<String> {
        p.input_schema
            .property_names()
            .chain(p.output_schema.property_names())
            .map(str::to_string)
            .collect()
    };
    let shape = |p: &ProducerSchema| -> (String, String) {
        (
            serde_json::to_string(&p.input_schema).unwrap_or_default(),
            serde_json::to_string(&p.output_schema).unwrap_or_default(),
        )
    };
    let ordering = a
        .location
        .cmp(&b.location)
        .then_with(|| keys(a).cmp(&keys(b)))
        .then_with(|| shape(a).cmp(&shape(b)));
    ordering == Ordering::Less
}

fn check_arguments(
    producer: &ProducerSchema,
    consumer: &ConsumerSchema,
    options: &CompareOptions,
    typos: &TypoDetector,
) -> Vec<Mismatch> {
    let input = &producer.input_schema;
    let provided: BTreeSet<&str> = consumer.arguments_provided.keys().map(String::as_str).collect();
    let allowed: BTreeSet<&str> = input.property_names().collect();
    let mut found = Vec::new();

    for key in input.required.iter().filter(|k| !provided.contains(k.as_str())) {
        found.push(mismatch(
            producer,
            consumer,
            IssueType::ArgumentError,
            format!("Missing required argument \"{key}\""),
            None,
        ));
    }

    if options.direction.reports_extra_arguments() {
        for key in provided.difference(&allowed) {
            let suggestion = typos.suggest(key, allowed.iter().copied());
            let mut description = format!("Unknown argument \"{key}\"");
            if let Some(canonical) = suggestion {
                description.push_str(&format!(" (did you mean \"{canonical}\"?)"));
            }
            found.push(mismatch(
                producer,
                consumer,
                IssueType::ArgumentError,
                description,
                suggestion.map(str::to_string),
            ));
        }
    }
    found
}

/// Response reads are best-effort: an unknown name with no plausible counterpart in
/// the producer's output passes silently.
fn check_response(
    producer: &ProducerSchema,
    consumer: &ConsumerSchema,
    typos: &TypoDetector,
) -> Vec<Mismatch> {
    let output = &producer.output_schema;
    if output.properties.is_empty() {
        return Vec::new();
    }
    let expected: BTreeSet<&str> = consumer.expected_properties.iter().map(String::as_str).collect();
    expected
        .into_iter()
        .filter_map(|path| {
            let suggestion = near_miss(output, path, typos)?;
            Some(mismatch(
                producer,
                consumer,
                IssueType::MissingProperty,
                format!(
                    "Expected property \"{path}\" not found in output of \"{}\" (did you mean \"{suggestion}\"?)",
                    producer.tool_name
                ),
                Some(suggestion),
            ))
        })
        .collect()
}

/// Walk a dotted path through object-typed properties. Returns the corrected path
/// when a segment is missing but has a plausible counterpart.
fn near_miss(schema: &NormalizedSchema, path: &str, typos: &TypoDetector) -> Option<String> {
    let mut current = schema;
    let mut walked: Vec<&str> = Vec::new();
    let segments: Vec<&str> = path.split('.').filter(|s| !s.is_empty()).collect();

    for (i, &segment) in segments.iter().enumerate() {
        // Array indices step through element types.
        if segment.parse::<usize>().is_ok() {
            walked.push(segment);
            continue;
        }
        let is_last = i + 1 == segments.len();
        match current.property(segment) {
            Some(def) => {
                walked.push(segment);
                if is_last {
                    return None;
                }
                current = object_schema(&def.ty)?;
            }
            None => {
                let canonical = typos.suggest(segment, current.property_names())?;
                walked.push(canonical);
                walked.extend(&segments[i + 1..]);
                return Some(walked.join("."));
            }
        }
    }
    None
}

/// Object schema reachable through arrays, nullable unions, and intersections.
fn object_schema(ty: &NormalizedType) -> Option<&NormalizedSchema> {
    match ty {
        NormalizedType::Object { schema } => Some(&**schema),
        NormalizedType::Array { element } => object_schema(element),
        NormalizedType::Union { variants } | NormalizedType::Intersection { variants } => {
            variants.iter().find_map(object_schema)
        }
        _ => None,
    }
}

fn mismatch(
    producer: &ProducerSchema,
    consumer: &ConsumerSchema,
    issue_type: IssueType,
    description: String,
    suggestion: Option<String>,
) -> Mismatch {
    Mismatch {
        tool_name: consumer.tool_name.clone(),
        issue_type,
        description,
        producer_definition: Some(producer.location.clone()),
        consumer_usage: Some(consumer.call_site.clone()),
        suggestion,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::Direction;
    use crate::schema::{ArgumentValue, PropertyDef, SchemaRef};
    use shapetrace_core::SourceLocation;

    fn schema(required: &[&str], optional: &[&str]) -> NormalizedSchema {
        let mut schema = NormalizedSchema::new(SchemaRef::new("test", "t"));
        for key in required {
            schema.insert_property(*key, PropertyDef::new(NormalizedType::string()));
        }
        for key in optional {
            schema.insert_property(*key, PropertyDef::new(NormalizedType::string()).optional());
        }
        schema
    }

    fn producer(name: &str, input: NormalizedSchema, output: NormalizedSchema) -> ProducerSchema {
        ProducerSchema {
            tool_name: name.into(),
            input_schema: input,
            output_schema: output,
            location: SourceLocation::new("server.ts", 1, 1),
        }
    }

    fn consumer(name: &str, args: &[&str], reads: &[&str]) -> ConsumerSchema {
        ConsumerSchema {
            tool_name: name.into(),
            call_site: SourceLocation::new("client.ts", 5, 3),
            arguments_provided: args
                .iter()
                .map(|k| (k.to_string(), ArgumentValue::Placeholder("x".into())))
                .collect(),
            expected_properties: reads.iter().map(|r| r.to_string()).collect(),
        }
    }

    fn run(p: ProducerSchema, c: ConsumerSchema, direction: Direction) -> TraceResult {
        compare_schemas(&[p], &[c], &CompareOptions::new(direction))
    }

    #[test]
    fn response_near_miss_suggests_property() {
        let output = schema(&["email", "name"], &[]);
        let result = run(
            producer("get_user", schema(&[], &[]), output),
            consumer("get_user", &[], &["emal", "name", "avatarUrl"]),
            Direction::ProducerToConsumer,
        );
        assert_eq!(result.mismatches.len(), 1);
        let m = &result.mismatches[0];
        assert_eq!(m.issue_type, IssueType::MissingProperty);
        assert_eq!(m.suggestion.as_deref(), Some("email"));
        assert!(m.description.contains("did you mean \"email\"?"));
    }

    #[test]
    fn response_checks_follow_dotted_paths() {
        let profile = schema(&["displayName"], &[]);
        let mut output = schema(&[], &[]);
        output.insert_property(
            "profile",
            PropertyDef::new(NormalizedType::object(profile)),
        );
        let result = run(
            producer("get_user", schema(&[], &[]), output),
            consumer("get_user", &[], &["profile.displayname", "profile.displayName"]),
            Direction::Bidirectional,
        );
        assert_eq!(result.mismatches.len(), 1);
        assert_eq!(
            result.mismatches[0].suggestion.as_deref(),
            Some("profile.displayName")
        );
    }

    #[test]
    fn consumer_to_producer_skips_response_checks() {
        let result = run(
            producer("get_user", schema(&[], &[]), schema(&["email"], &[])),
            consumer("get_user", &[], &["emial"]),
            Direction::ConsumerToProducer,
        );
        assert!(result.is_clean());
        assert_eq!(result.matches.len(), 1);
    }

    #[test]
    fn optional_arguments_may_be_omitted() {
        let result = run(
            producer("list", schema(&[], &["limit", "cursor"]), schema(&[], &[])),
            consumer("list", &["limit"], &[]),
            Direction::Bidirectional,
        );
        assert!(result.is_clean());
    }

    #[test]
    fn earliest_producer_wins_regardless_of_order() {
        let mut early = producer("t", schema(&["a"], &[]), schema(&[], &[]));
        early.location = SourceLocation::new("a.ts", 1, 1);
        let mut late = producer("t", schema(&["b"], &[]), schema(&[], &[]));
        late.location = SourceLocation::new("b.ts", 1, 1);
        let c = consumer("t", &["a"], &[]);
        let options = CompareOptions::default();

        let forward = compare_schemas(&[early.clone(), late.clone()], &[c.clone()], &options);
        let backward = compare_schemas(&[late, early], &[c], &options);
        assert!(forward.is_clean());
        assert_eq!(forward, backward);
    }

    #[test]
    fn colocated_producers_differing_in_requiredness_pick_one_winner() {
        let strict = producer("t", schema(&["id"], &[]), schema(&[], &[]));
        let lenient = producer("t", schema(&[], &["id"]), schema(&[], &[]));
        let c = consumer("t", &[], &[]);
        let options = CompareOptions::default();

        let forward = compare_schemas(&[strict.clone(), lenient.clone()], &[c.clone()], &options);
        let backward = compare_schemas(&[lenient, strict], &[c], &options);
        assert_eq!(forward, backward);
        assert_eq!(forward.mismatches.len() + forward.matches.len(), 1);
    }

    #[test]
    fn missing_keys_report_in_sorted_order() {
        let result = run(
            producer("t", schema(&["zeta", "alpha"], &[]), schema(&[], &[])),
            consumer("t", &[], &[]),
            Direction::ProducerToConsumer,
        );
        let descriptions: Vec<&str> = result.mismatches.iter().map(|m| m.description.as_str()).collect();
        assert_eq!(
            descriptions,
            vec![
                "Missing required argument \"alpha\"",
                "Missing required argument \"zeta\"",
            ]
        );
    }
}
