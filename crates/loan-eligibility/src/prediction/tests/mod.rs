mod adapter;
mod common;
