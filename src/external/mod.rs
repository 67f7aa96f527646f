// ABOUTME: External API clients beyond the LLM providers
// ABOUTME: Currently the USDA FoodData Central composition client
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 Morsel Project

//! External service clients.

pub mod usda;
