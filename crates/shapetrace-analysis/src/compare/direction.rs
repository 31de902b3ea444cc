//! Comparison direction.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use shapetrace_core::errors::CompareError;

/// Which side of a contract is authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Producers define the contract; consumers must conform. Response reads are checked.
    #[default]
    ProducerToConsumer,
    /// Request side only; producers tolerate extra arguments.
    ConsumerToProducer,
    /// Strict request checks plus response checks.
    Bidirectional,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ProducerToConsumer => "producer_to_consumer",
            Self::ConsumerToProducer => "consumer_to_producer",
            Self::Bidirectional => "bidirectional",
        }
    }

    /// Whether arguments the producer does not declare are reported.
    pub fn reports_extra_arguments(self) -> bool {
        !matches!(self, Self::ConsumerToProducer)
    }

    /// Whether response property reads are checked against the producer's output.
    pub fn checks_response(self) -> bool {
        !matches!(self, Self::ConsumerToProducer)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = CompareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "producer_to_consumer" => Ok(Self::ProducerToConsumer),
            "consumer_to_producer" => Ok(Self::ConsumerToProducer),
            "bidirectional" => Ok(Self::Bidirectional),
            other => Err(CompareError::InvalidDirection {
                value: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wire_names() {
        for direction in [
            Direction::ProducerToConsumer,
            Direction::ConsumerToProducer,
            Direction::Bidirectional,
        ] {
            assert_eq!(direction.as_str().parse::<Direction>().unwrap(), direction);
            let json = serde_json::to_string(&direction).unwrap();
            assert_eq!(json, format!("\"{direction}\""));
        }
    }

    #[test]
    fn rejects_unknown_direction() {
        let err = "sideways".parse::<Direction>().unwrap_err();
        assert_eq!(
            err,
            CompareError::InvalidDirection {
                value: "sideways".into()
            }
        );
    }

    #[test]
    fn default_is_producer_to_consumer() {
        assert_eq!(Direction::default(), Direction::ProducerToConsumer);
        assert!(!Direction::ConsumerToProducer.checks_response());
        assert!(Direction::Bidirectional.reports_extra_arguments());
    }
}
