//! # Employee Authentication
//!
//! Password hashing, login, and employee registration.
//!
//! ## Login Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  authenticate(employees, "admin", "admin123")                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  find employee by username ──── none ──► Ok(None)                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  argon2 verify(plain, stored PHC hash) ── mismatch ──► Ok(None)        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Ok(Some(Session { employee_id, username, role }))                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Unknown usernames and wrong passwords look the same to the caller.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use tracing::{debug, info};

use stockroom_core::validation::{validate_password, validate_username};
use stockroom_core::{Employee, Role, Session, ValidationError};

use crate::error::{StoreError, StoreResult};
use crate::store::{push_with_next_id, EntityStore};

/// Hashes a password for storage (argon2, random salt, PHC string).
pub fn hash_password(password: &str) -> StoreResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| StoreError::PasswordHash(e.to_string()))?;

    Ok(hash.to_string())
}

/// Checks a password against a stored hash. A malformed hash never matches.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Opens a session when the username exists and the password matches.
pub fn authenticate(
    employees: &EntityStore<Employee>,
    username: &str,
    password: &str,
) -> StoreResult<Option<Session>> {
    let employee = employees
        .get_all()?
        .into_iter()
        .find(|e| e.username == username);

    match employee {
        Some(employee) if verify_password(password, &employee.password) => {
            info!(username, role = %employee.role, "Login succeeded");
            Ok(Some(Session::for_employee(&employee)))
        }
        _ => {
            debug!(username, "Login rejected");
            Ok(None)
        }
    }
}

/// Creates an employee. Only an Admin session may do this.
///
/// ## Errors
/// * `Forbidden` - `session` is not an Admin
/// * `Validation` - blank/whitespace username, empty password, or the
///   username is already taken
pub fn register_employee(
    employees: &EntityStore<Employee>,
    session: &Session,
    username: &str,
    password: &str,
    role: Role,
) -> StoreResult<Employee> {
    session.require_role(Role::Admin, "register employees")?;
    insert_employee(employees, username, password, role)
}

/// Creates the first Admin when no employee exists yet.
///
/// Returns `None`, without writing, if the collection is not empty.
pub fn bootstrap_admin(
    employees: &EntityStore<Employee>,
    username: &str,
    password: &str,
) -> StoreResult<Option<Employee>> {
    validate_username(username)?;
    validate_password(password)?;
    let hash = hash_password(password)?;

    let created = employees.transact(|items| {
        if !items.is_empty() {
            return Err(Bootstrap::AlreadySeeded);
        }
        let admin = push_with_next_id(items, employee(username, hash, Role::Admin));
        info!(username, "Bootstrap admin created");
        Ok(admin)
    });

    match created {
        Ok(admin) => Ok(Some(admin)),
        Err(Bootstrap::AlreadySeeded) => {
            debug!(username, "Employees exist, bootstrap skipped");
            Ok(None)
        }
        Err(Bootstrap::Store(e)) => Err(e),
    }
}

/// Aborts the bootstrap transaction so a populated store is not rewritten.
enum Bootstrap {
    AlreadySeeded,
    Store(StoreError),
}

impl From<StoreError> for Bootstrap {
    fn from(e: StoreError) -> Self {
        Bootstrap::Store(e)
    }
}

fn insert_employee(
    employees: &EntityStore<Employee>,
    username: &str,
    password: &str,
    role: Role,
) -> StoreResult<Employee> {
    validate_username(username)?;
    validate_password(password)?;
    let hash = hash_password(password)?;

    employees.transact(|items| {
        if items.iter().any(|e| e.username == username) {
            return Err(ValidationError::Duplicate {
                field: "username".to_string(),
                value: username.to_string(),
            }
            .into());
        }
        let created = push_with_next_id(items, employee(username, hash, role));
        info!(username, %role, id = created.id, "Employee registered");
        Ok(created)
    })
}

fn employee(username: &str, password_hash: String, role: Role) -> Employee {
    Employee {
        id: 0,
        username: username.to_string(),
        password: password_hash,
        role,
    }
}
