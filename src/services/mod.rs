pub mod auth_service;
pub mod auth_service_impl;
pub mod booking_service;
pub mod booking_service_impl;
pub mod password_policy;
pub mod recovery_service;
pub mod recovery_service_impl;
pub mod validation;

pub use auth_service::{AuthError, AuthService};
pub use auth_service_impl::SeaOrmAuthService;
pub use booking_service::{BookingError, BookingOutcome, BookingService, HomeView};
pub use booking_service_impl::SeaOrmBookingService;
pub use password_policy::{PasswordCandidate, PasswordPolicy, PasswordRule};
pub use recovery_service::{ChallengePass, RecoveryError, RecoveryService, ResetRequest};
pub use recovery_service_impl::SeaOrmRecoveryService;
pub use validation::ValidationError;
