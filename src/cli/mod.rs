//! CLI module - Command-line interface for Booker
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};

/// Booker - appointment booking with security-question password recovery
#[derive(Parser)]
#[command(name = "booker")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server (default)
    #[command(alias = "web")]
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Manage user accounts
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Manage appointment slots
    #[command(alias = "appt")]
    Appointment {
        #[command(subcommand)]
        command: AppointmentCommands,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Create a user account
    Add {
        username: String,
        password: String,
        /// Grant access to the admin screen
        #[arg(long)]
        admin: bool,
    },
    /// List user accounts
    #[command(alias = "ls")]
    List,
}

#[derive(Subcommand)]
pub enum AppointmentCommands {
    /// Add an open slot. Start time as `YYYY-MM-DD HH:MM` in UTC
    Add { start: String },
    /// List every appointment with its owner
    #[command(alias = "ls")]
    List,
}

pub use commands::*;
