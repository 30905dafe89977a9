//! Code-context subsystem: policies, tool-call servicing, and the symbol
//! locators that answer the assistant's lookup requests.

pub mod locator;
pub mod policy;
pub mod servicer;

pub use locator::{
    CodeContextRequest, EntityCategory, Language, LocatorError, LocatorFactory, SymbolLocator,
};
pub use policy::{CodeContextMode, CodeContextPolicy, policy_for};
pub use servicer::{CONTEXT_FUNCTION, CONTEXT_FUNCTION_ALIAS, ToolCallServicer};
