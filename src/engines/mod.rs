// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod socks_engine;
pub mod traits;

pub use socks_engine::SocksFetcher;
pub use traits::{FetchError, FetchFailure, FetchResult, Fetcher};
