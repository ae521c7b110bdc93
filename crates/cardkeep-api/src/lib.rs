// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

pub const CRATE_NAME: &str = "cardkeep-api";

mod dto;
mod errors;
mod params;

pub use dto::{
    CreateDeckBody, LoginBody, RegisterBody, RequestResetBody, ResetPasswordBody, SaveResponse,
};
pub use errors::{ApiError, ApiErrorCode};
pub use params::{parse_card_search_params, CardSearchParams};
