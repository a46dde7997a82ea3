//! Partition routing module
//!
//! Child streams run once per parent record. A [`Partition`] is the slice of
//! a parent record that a child instance needs: its identifier and the
//! values substituted into the child's endpoint template.

mod routers;
mod types;

pub use routers::ParentRouter;
pub use types::Partition;

#[cfg(test)]
mod tests;
