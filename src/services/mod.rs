// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod account;
pub mod password;
pub mod profile;
pub mod token;

pub use account::{
    AccountService, AuthResponse, ChangePasswordRequest, LoginRequest, SignupRequest,
    UpdateMeRequest,
};
pub use password::{PasswordError, PasswordHasher};
pub use profile::{PlayerOwner, PlayerPage, PlayerView, ProfileService};
pub use token::{Claims, TokenError, TokenIdentity, TokenService};
