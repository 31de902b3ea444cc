//! Declarative pointer to a schema sub-fragment.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a schema sits relative to a matched node. Exactly one variant is active.
///
/// In pattern packs: `{ arg = 1 }`, `{ arg_named = "inputSchema" }`, `"return"`,
/// `{ type_param = 0 }`, `"body"`, `{ chain_method = "input" }`, `{ decorator_arg = 0 }`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SchemaLocation {
    /// i-th positional argument of a call.
    Arg(usize),
    /// Value of property `name` in the first object-literal argument that has it.
    ArgNamed(String),
    /// Declared return type of the nearest function.
    Return,
    /// i-th type argument.
    TypeParam(usize),
    /// Returned expression, initializer, or the node itself.
    Body,
    /// First argument of the chained call named `name`.
    ChainMethod(String),
    /// i-th argument of a decorator's call form.
    DecoratorArg(usize),
}

impl fmt::Display for SchemaLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arg(i) => write!(f, "arg({i})"),
            Self::ArgNamed(name) => write!(f, "argNamed({name})"),
            Self::Return => write!(f, "return"),
            Self::TypeParam(i) => write!(f, "typeParam({i})"),
            Self::Body => write!(f, "body"),
            Self::ChainMethod(name) => write!(f, "chainMethod({name})"),
            Self::DecoratorArg(i) => write!(f, "decoratorArg({i})"),
        }
    }
}
