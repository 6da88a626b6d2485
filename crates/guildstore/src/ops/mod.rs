//! Typed CRUD operations on [`crate::store::Store`], one module per entity
//! area.

mod auto_response;
mod balance;
mod daily;
mod job;
mod mod_role;
mod panel;
mod ticket;
