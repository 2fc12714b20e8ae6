//! Huffman-coding compressor with a self-describing container format.
//!
//! The codec is split into the usual stages, each in its own module under [`algorithms`]:
//! frequency scanning, tree building, code generation and bit packing. [`container`] ties
//! them together into [`compress`](container::compress) and [`decompress`](container::decompress).

#[macro_export]
macro_rules! if_tracing {
    {$($body:tt)*} => {
        ::cfg_if::cfg_if! {
            if #[cfg(feature = "tracing")] {
                $($body)*
            }
        }
    };
}

pub mod algorithms;
pub mod cli;
pub mod compressor;
pub mod config;
pub mod container;
pub mod history;


pub use crate::compressor::{CodecError, Compressor};
pub use crate::container::{compress, decompress};
