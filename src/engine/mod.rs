// Module Definition

/// Expands `$body` sixteen times with `$k` bound to 0..16
macro_rules! unroll16 {
    (@expand $k:ident => $body:expr; $($n:literal)*) => {
        $( { let $k: usize = $n; $body; } )*
    };
    ($k:ident => $body:expr) => {
        unroll16!(@expand $k => $body; 0 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15)
    };
}

pub mod catalog; // Built-in kernel table
pub mod config;
#[cfg(feature = "python")]
pub mod controller; // Python harness binding
pub mod descriptor;
pub mod element;
pub mod error;
pub mod kernels; // Scan kernels
pub mod memory;
pub mod parallel; // Disjoint-region invocation
pub mod registry;
pub mod walk; // Permutation-walk kernels
