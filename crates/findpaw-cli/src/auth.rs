//! Sign-in and account command handlers.
//!
//! Sign-in is split across two invocations: `login-url` prints the provider
//! URL and the PKCE verifier, `callback` finishes the exchange with the code
//! the provider appended to the redirect.

use clap::Subcommand;
use findpaw_core::UserStats;
use findpaw_supabase::{handle_callback, CallbackParams, Provider, SessionStore, SupabaseClient};

#[derive(Debug, Subcommand)]
pub enum AuthCommands {
    /// Print the Kakao sign-in URL and the verifier needed by `callback`
    LoginUrl {
        /// Where the provider redirects back (defaults to `AUTH_REDIRECT_URL`)
        #[arg(long)]
        redirect_to: Option<String>,
    },
    /// Finish sign-in with the parameters from the redirect back
    Callback {
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        error: Option<String>,
        #[arg(long)]
        error_description: Option<String>,
        /// Verifier printed by `login-url`
        #[arg(long)]
        verifier: String,
    },
    /// Show the signed-in user's profile and lost-post counts
    Whoami {
        #[arg(long, env = "FINDPAW_ACCESS_TOKEN", hide_env_values = true)]
        access_token: String,
    },
}

pub(crate) fn run_login_url(client: &SupabaseClient, redirect_to: &str) {
    let request = client.start_sign_in(Provider::Kakao, redirect_to, None);
    println!("Open this URL to sign in:");
    println!("  {}", request.url);
    println!("Then run `findpaw auth callback --code <code> --verifier {}`", request.code_verifier);
}

/// Exchanges the callback code and prints the resulting session.
///
/// # Errors
///
/// Returns an error when the provider reported one or the exchange failed;
/// the redirect delay is honoured first.
pub(crate) async fn run_callback(
    client: &SupabaseClient,
    params: &CallbackParams,
    verifier: &str,
) -> anyhow::Result<()> {
    let sessions = SessionStore::new();
    let outcome = handle_callback(client, &sessions, params, verifier).await;

    if let Some(message) = outcome.error {
        println!("Sign-in failed: {message}");
        tokio::time::sleep(outcome.delay).await;
        anyhow::bail!("sign-in failed, redirecting to {}", outcome.redirect_to);
    }

    match sessions.get_session() {
        Some(session) => {
            println!("Signed in as {}", session.user.id);
            println!("  access token: {}", session.access_token);
            println!("  expires in:   {}s", session.expires_in);
        }
        None => println!("No code supplied; nothing to exchange."),
    }
    Ok(())
}

pub(crate) fn format_stats(stats: &UserStats) -> String {
    format!(
        "lost posts: {} (searching {}, found {}, closed {})",
        stats.lost_posts_count, stats.searching_count, stats.found_count, stats.closed_count
    )
}

/// Resolves the token's user, ensures a profile exists, and prints stats.
///
/// # Errors
///
/// Returns an error if the token is no longer accepted or a backend call
/// other than a per-status count fails.
pub(crate) async fn run_whoami(client: &SupabaseClient, access_token: &str) -> anyhow::Result<()> {
    let Some(user) = client.get_user(access_token).await? else {
        anyhow::bail!("session expired; sign in again with `findpaw auth login-url`");
    };

    let authed = client.with_access_token(access_token);
    let profile = authed.fetch_or_create_profile(user.id).await?;
    let stats = authed.user_stats(user.id).await?;

    println!("{}", profile.nickname.as_deref().unwrap_or_default());
    if let Some(email) = user.email.as_deref() {
        println!("  email: {email}");
    }
    println!("  joined: {}", profile.created_at.format("%Y-%m-%d"));
    println!("  {}", format_stats(&stats));
    Ok(())
}
