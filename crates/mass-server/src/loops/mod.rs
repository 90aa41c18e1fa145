//! Background loops for continuous processing.

pub mod route_poll_loop;
