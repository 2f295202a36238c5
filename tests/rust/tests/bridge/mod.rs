//! End-to-end flows through the application boundary.
