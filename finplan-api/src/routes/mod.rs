/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Authentication endpoint (verify, login, register, reset, logout)
/// - `goals`: Savings goal CRUD
/// - `transactions`: Transaction and tag CRUD plus statistics
/// - `budgets`: Budget CRUD
/// - `calendar`: Calendar event CRUD

pub mod auth;
pub mod budgets;
pub mod calendar;
pub mod goals;
pub mod health;
pub mod transactions;
