//! Async resources: users and posts, each with its own request cycle

use super::ScenarioContext;
use serde::Deserialize;
use state_kit_hooks::{AsyncResource, FetchEnvironment, ResourceState};
use state_kit_runtime::StoreError;
use std::fmt::Write as _;
use std::sync::Arc;

/// A user record
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct User {
    /// User id
    pub id: u64,
    /// Full name
    pub name: String,
    /// Email address
    pub email: String,
    /// Phone number
    #[serde(default)]
    pub phone: String,
    /// Personal website
    #[serde(default)]
    pub website: String,
}

/// A post record
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Post id
    pub id: u64,
    /// Author's user id
    pub user_id: u64,
    /// Title
    pub title: String,
    /// Body text
    pub body: String,
}

/// Number of users listed in the report
const USERS_SHOWN: usize = 5;

/// Render a resource state as one report line
pub fn describe<T>(label: &str, state: &ResourceState<T>, render: impl Fn(&T) -> String) -> String {
    if state.loading {
        return format!("{label}: loading");
    }

    match (&state.data, &state.error) {
        (_, Some(error)) => format!("{label}: error: {error}"),
        (Some(data), None) => format!("{label}: {}", render(data)),
        (None, None) => format!("{label}: no data"),
    }
}

fn render_users(users: &[User]) -> String {
    let mut out = format!("{} users", users.len());
    for user in users.iter().take(USERS_SHOWN) {
        let _ = write!(out, "\n  - {} <{}>", user.name, user.email);
    }
    out
}

fn render_posts(posts: &[Post]) -> String {
    let mut out = format!("{} posts", posts.len());
    for post in posts {
        let _ = write!(out, "\n  - #{} {}", post.id, post.title);
    }
    out
}

pub(crate) async fn demo(ctx: &ScenarioContext) -> Result<Vec<String>, StoreError> {
    let env = FetchEnvironment::new(Arc::clone(&ctx.http));
    let settle = ctx.config.settle_timeout();

    let users = AsyncResource::<Vec<User>>::create(ctx.config.users_url.clone(), env.clone()).await?;
    let posts = AsyncResource::<Vec<Post>>::create(ctx.config.posts_url.clone(), env).await?;

    let user_lines = |users: &Vec<User>| render_users(users);
    let post_lines = |posts: &Vec<Post>| render_posts(posts);

    let mut lines = vec![
        describe("users", &users.snapshot().await, user_lines),
        describe("posts", &posts.snapshot().await, post_lines),
    ];

    lines.push(describe("users", &users.settled(settle).await?, user_lines));
    lines.push(describe("posts", &posts.settled(settle).await?, post_lines));

    users.refetch().await?;
    lines.push(describe("users (refetch)", &users.snapshot().await, user_lines));
    lines.push(describe("users (refetch)", &users.settled(settle).await?, user_lines));

    users.shutdown(ctx.config.shutdown_timeout()).await?;
    posts.shutdown(ctx.config.shutdown_timeout()).await?;

    Ok(lines)
}
