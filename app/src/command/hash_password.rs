use policyqa_core::util::hash_password;

/// Strategy for printing an Argon2 hash for `users[].password_hash`.
#[derive(Debug, Clone, Copy)]
pub struct HashPasswordStrategy;

impl super::CommandStrategy for HashPasswordStrategy {
    type Input = String;

    async fn execute(&self, password: Self::Input) -> anyhow::Result<()> {
        if password.is_empty() {
            anyhow::bail!("Password must not be empty");
        }
        println!("{}", hash_password(&password)?);
        Ok(())
    }
}
