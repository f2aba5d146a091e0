use crate::auth::password;
use anyhow::{Result, anyhow};

/// Hash a password for `ADMIN_PASSWORD_HASH`, enforcing the strength
/// policy before printing the bcrypt hash to stdout.
///
/// # Errors
/// Returns an error if the password fails the policy or hashing fails.
pub fn handle(password: &str) -> Result<()> {
    let strength = password::evaluate(password)
        .map_err(|violation| anyhow!("password rejected: {}", violation.message()))?;

    let hash = password::hash(password)?;

    println!("{hash}");
    eprintln!("strength: {}", strength.as_str());

    Ok(())
}
