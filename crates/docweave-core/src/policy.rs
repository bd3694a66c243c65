//! Classification policy.
//!
//! A pure function of a declaration and the current settings. Analysis, fix,
//! refactor and preview all call [`classify`] and never cache its result.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{OverridesBehavior, Settings};
use crate::walker::{Declaration, DeclarationKind};

/// What kind of documentation a declaration should receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Not reported and not documented.
    Skip,
    /// `/// <inheritdoc />`.
    InheritDoc,
    /// Summary made of the constant's literal value.
    ValueSummary,
    /// Generated by the service.
    Synthesize,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Skip => "skip",
            Category::InheritDoc => "inherit-doc",
            Category::ValueSummary => "value-summary",
            Category::Synthesize => "synthesize",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a declaration, first matching rule wins:
///
/// 1. local variables are skipped;
/// 2. overrides and explicit interface implementations follow
///    [`OverridesBehavior`];
/// 3. `const` declarations with a literal initializer use their value when
///    enabled;
/// 4. everything else is synthesized.
pub fn classify(declaration: &Declaration, settings: &Settings) -> Category {
    if declaration.kind == DeclarationKind::LocalVariable {
        return Category::Skip;
    }

    if declaration.implements {
        return match settings.overrides {
            OverridesBehavior::UseInheritDoc => Category::InheritDoc,
            OverridesBehavior::DoNotDocument => Category::Skip,
            OverridesBehavior::Synthesize => Category::Synthesize,
        };
    }

    if declaration.constant_literal.is_some() && settings.use_value_for_literal_constants {
        return Category::ValueSummary;
    }

    Category::Synthesize
}

/// Whether fixing the declaration would call the generation service.
pub fn calls_service(declaration: &Declaration, settings: &Settings) -> bool {
    classify(declaration, settings) == Category::Synthesize
}
