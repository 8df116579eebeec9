//! Property-based tests

mod paging;
