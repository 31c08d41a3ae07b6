// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Caller-configurable veto over gap assignment.
//!
//! The expression language behind `merge_gaps_where` lives outside this
//! crate. A caller plugs it in through [`ExpressionCompiler`], which turns the
//! expression into a [`ShapePredicate`] evaluated per shape id. Shapes for
//! which the predicate holds do not receive merged gaps.

use std::fmt;

use crate::error::{Error, Result};
use crate::layer::Layer;
use crate::options::DissolveOptions;

/// Boolean test over shape ids of one layer.
pub trait ShapePredicate: Send + Sync {
    fn matches(&self, shape: usize) -> bool;
}

impl<F> ShapePredicate for F
where
    F: Fn(usize) -> bool + Send + Sync,
{
    fn matches(&self, shape: usize) -> bool {
        self(shape)
    }
}

/// Compiles attribute expressions against a layer.
///
/// Errors are reported as plain messages and wrapped in
/// [`Error::Expression`] by the caller.
pub trait ExpressionCompiler {
    fn compile(
        &self,
        expression: &str,
        layer: &Layer,
    ) -> std::result::Result<Box<dyn ShapePredicate>, String>;
}

impl<F> ExpressionCompiler for F
where
    F: Fn(&str, &Layer) -> std::result::Result<Box<dyn ShapePredicate>, String>,
{
    fn compile(
        &self,
        expression: &str,
        layer: &Layer,
    ) -> std::result::Result<Box<dyn ShapePredicate>, String> {
        self(expression, layer)
    }
}

/// Decides whether a gap may be assigned to a given bordering shape.
#[derive(Default)]
pub enum AdjacencyFilter {
    /// Every bordering shape may receive the gap.
    #[default]
    AcceptAll,
    /// Shapes matching `expression` veto assignment to themselves.
    Expression {
        expression: String,
        predicate: Box<dyn ShapePredicate>,
    },
}

impl AdjacencyFilter {
    /// Resolves the filter from `merge_gaps_where`.
    ///
    /// An expression without a compiler, or one the compiler rejects, is a
    /// configuration error.
    pub fn from_options(
        layer: &Layer,
        opts: &DissolveOptions,
        compiler: Option<&dyn ExpressionCompiler>,
    ) -> Result<Self> {
        let Some(expression) = opts.merge_gaps_where.as_deref() else {
            return Ok(AdjacencyFilter::AcceptAll);
        };
        let compiler = compiler.ok_or_else(|| {
            Error::Config(format!(
                "merge_gaps_where {expression:?} requires an expression compiler"
            ))
        })?;
        let predicate =
            compiler
                .compile(expression, layer)
                .map_err(|reason| Error::Expression {
                    expression: expression.to_string(),
                    reason,
                })?;
        Ok(AdjacencyFilter::Expression {
            expression: expression.to_string(),
            predicate,
        })
    }

    /// True when `shape` may receive a gap.
    pub fn accepts(&self, shape: usize) -> bool {
        match self {
            AdjacencyFilter::AcceptAll => true,
            AdjacencyFilter::Expression { predicate, .. } => !predicate.matches(shape),
        }
    }

    /// Policy description for the gap-closure message; empty for the default.
    pub fn label(&self) -> String {
        match self {
            AdjacencyFilter::AcceptAll => String::new(),
            AdjacencyFilter::Expression { expression, .. } => {
                format!("Excluded gap assignment where: {expression}")
            }
        }
    }
}

impl fmt::Debug for AdjacencyFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdjacencyFilter::AcceptAll => f.write_str("AcceptAll"),
            AdjacencyFilter::Expression { expression, .. } => f
                .debug_struct("Expression")
                .field("expression", expression)
                .finish_non_exhaustive(),
        }
    }
}
