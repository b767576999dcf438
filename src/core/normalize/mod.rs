//! Normalization of raw Ruby trees.
//!
//! The [`Normalizer`] walks a raw tree once and produces a [`Normalized`]
//! result: modules, classes and method definitions wrap the calls found
//! inside them, and calls to recognized translation helpers become
//! [`TranslationCall`]s with their key, receiver and options.
//!
//! ## Module Structure
//!
//! - `nodes`: normalized node model and the `Normalized` result type
//! - `normalizer`: per-kind dispatch and visibility tracking
//! - `arguments`: positional vs. options classification of call arguments
//! - `call_shapes`: recognized translation and visibility method names
//! - `error`: errors that abort normalization

pub mod arguments;
pub mod call_shapes;
mod error;
pub mod nodes;
mod normalizer;


pub use arguments::{ClassifiedArguments, classify};
pub use call_shapes::CallShapes;
pub use error::NormalizeError;
pub use nodes::{
    BlockNode, CallNode, ClassNode, DefNode, InterpolatedString, LambdaNode, Located, Mapping,
    ModuleNode, Node, Normalized, Origin, Primitive, TranslationCall,
};
pub use normalizer::Normalizer;
