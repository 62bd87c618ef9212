//! Turning human names into Basecamp IDs.
//!
//! Numeric tokens pass straight through without touching the network. Names
//! are matched against a listing (projects, people, todolists) fetched once
//! per invocation:
//!
//! 1. exact, case-sensitive match wins outright
//! 2. a single case-insensitive match wins; several are ambiguous
//! 3. a single substring match wins; several are ambiguous
//! 4. otherwise not found, with suggestions when something looks close

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};

use crate::api::{decode, decode_all, BasecampApi};
use crate::completion::CompletionCache;
use crate::dock;
use crate::error::{BcqError, Result};
use crate::ids::{is_numeric_id, looks_like_email};
use crate::models::{Person, Project, Todolist, ToolKind};
use crate::pagination::ListOptions;

/// An ID plus its display name when the resolver learned it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub id: String,
    pub name: Option<String>,
}

impl Resolved {
    fn passthrough(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: None,
        }
    }

    fn named(id: i64, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: Some(name.to_string()),
        }
    }

    /// Display name, falling back to `#id`.
    pub fn label(&self) -> String {
        self.name.clone().unwrap_or_else(|| format!("#{}", self.id))
    }
}

/// Outcome of matching a token against display names.
#[derive(Debug, PartialEq, Eq)]
pub enum NameMatch<'a, T> {
    One(&'a T),
    Many(Vec<&'a T>),
    None,
}

/// Apply the matching policy to `items`.
pub fn match_name<'a, T>(items: &'a [T], token: &str, name: impl Fn(&T) -> &str) -> NameMatch<'a, T> {
    if let Some(exact) = items.iter().find(|i| name(*i) == token) {
        return NameMatch::One(exact);
    }

    let lowered = token.to_lowercase();
    let folded: Vec<&T> = items
        .iter()
        .filter(|i| name(*i).to_lowercase() == lowered)
        .collect();
    match folded.len() {
        1 => return NameMatch::One(folded[0]),
        n if n > 1 => return NameMatch::Many(folded),
        _ => {}
    }

    let partial: Vec<&T> = items
        .iter()
        .filter(|i| name(*i).to_lowercase().contains(&lowered))
        .collect();
    match partial.len() {
        0 => NameMatch::None,
        1 => NameMatch::One(partial[0]),
        _ => NameMatch::Many(partial),
    }
}

/// Up to three names that look close to `token`: a shared prefix of at
/// least two characters, or containing one of its words.
pub fn suggest<'a>(token: &str, names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let lowered = token.to_lowercase();
    let words: Vec<&str> = lowered.split_whitespace().filter(|w| w.len() >= 2).collect();

    names
        .into_iter()
        .filter(|name| {
            let candidate = name.to_lowercase();
            common_prefix_len(&candidate, &lowered) >= 2
                || words.iter().any(|w| candidate.contains(w))
        })
        .take(3)
        .map(str::to_string)
        .collect()
}

fn common_prefix_len(a: &str, b: &str) -> usize {
    a.chars().zip(b.chars()).take_while(|(x, y)| x == y).count()
}

fn not_found(resource: &str, token: &str, suggestions: Vec<String>) -> BcqError {
    if suggestions.is_empty() {
        BcqError::not_found(resource, token)
    } else {
        BcqError::not_found_hint(
            resource,
            token,
            format!("Did you mean: {}", suggestions.join(", ")),
        )
    }
}

/// Resolve a token against a named listing.
fn resolve_in<T>(
    resource: &str,
    items: &[T],
    token: &str,
    id: impl Fn(&T) -> i64,
    name: impl Fn(&T) -> &str,
) -> Result<Resolved> {
    match match_name(items, token, &name) {
        NameMatch::One(item) => Ok(Resolved::named(id(item), name(item))),
        NameMatch::Many(items) => Err(BcqError::ambiguous(
            resource,
            items
                .iter()
                .map(|i| format!("{}: {}", id(*i), name(*i)))
                .collect(),
        )),
        NameMatch::None => Err(not_found(
            &capitalize(resource),
            token,
            suggest(token, items.iter().map(|i| name(i))),
        )),
    }
}

/// Upper-case the first character, for resource names in messages.
pub(crate) fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Per-invocation name resolver with memoized listings.
pub struct Resolver {
    api: Arc<dyn BasecampApi>,
    completion: Option<CompletionCache>,
    projects: OnceCell<Vec<Project>>,
    people: OnceCell<Vec<Person>>,
    me: OnceCell<Person>,
    todolists: Mutex<HashMap<String, Vec<Todolist>>>,
}

impl Resolver {
    pub fn new(api: Arc<dyn BasecampApi>, completion: Option<CompletionCache>) -> Self {
        Self {
            api,
            completion,
            projects: OnceCell::new(),
            people: OnceCell::new(),
            me: OnceCell::new(),
            todolists: Mutex::new(HashMap::new()),
        }
    }

    /// All active projects. A fetch refreshes the completion cache.
    pub async fn projects(&self) -> Result<&[Project]> {
        let projects = self
            .projects
            .get_or_try_init(|| async {
                let listing = self.api.get_all("/projects.json", &ListOptions::all()).await?;
                let projects: Vec<Project> = decode_all(listing.items)?;
                if let Some(cache) = &self.completion {
                    cache.refresh_projects(&projects);
                }
                Ok::<_, BcqError>(projects)
            })
            .await?;
        Ok(projects)
    }

    pub async fn people(&self) -> Result<&[Person]> {
        let people = self
            .people
            .get_or_try_init(|| async {
                let listing = self.api.get_all("/people.json", &ListOptions::all()).await?;
                decode_all::<Person>(listing.items)
            })
            .await?;
        Ok(people)
    }

    /// The authenticated person.
    pub async fn me(&self) -> Result<&Person> {
        self.me
            .get_or_try_init(|| async {
                let profile = self.api.get("/my/profile.json").await?;
                decode::<Person>(profile)
            })
            .await
    }

    pub async fn resolve_project(&self, token: &str) -> Result<Resolved> {
        let token = token.trim();
        if token.is_empty() {
            return Err(BcqError::usage("Project name or ID required"));
        }
        if is_numeric_id(token) {
            return Ok(Resolved::passthrough(token));
        }
        let projects = self.projects().await?;
        resolve_in("project", projects, token, |p| p.id, |p| p.name.as_str())
    }

    /// Resolve "me", a numeric ID, an email address, or a name.
    pub async fn resolve_person(&self, token: &str) -> Result<Resolved> {
        let token = token.trim();
        if token.is_empty() {
            return Err(BcqError::usage("Person name or ID required"));
        }
        if token.eq_ignore_ascii_case("me") {
            let me = self.me().await?;
            return Ok(Resolved::named(me.id, &me.name));
        }
        if is_numeric_id(token) {
            return Ok(Resolved::passthrough(token));
        }

        let people = self.people().await?;
        if looks_like_email(token) {
            return people
                .iter()
                .find(|p| {
                    p.email_address
                        .as_deref()
                        .is_some_and(|e| e.eq_ignore_ascii_case(token))
                })
                .map(|p| Resolved::named(p.id, &p.name))
                .ok_or_else(|| BcqError::not_found("Person", token));
        }
        resolve_in("person", people, token, |p| p.id, |p| p.name.as_str())
    }

    /// Resolve several people, failing on the first that cannot be resolved.
    pub async fn resolve_people(&self, tokens: &[String]) -> Result<Vec<i64>> {
        let mut ids = Vec::with_capacity(tokens.len());
        for token in tokens {
            let resolved = self.resolve_person(token).await?;
            ids.push(parse_id(&resolved.id)?);
        }
        Ok(ids)
    }

    /// Todolists in a project's todoset.
    pub async fn todolists(&self, project_id: &str) -> Result<Vec<Todolist>> {
        let mut cache = self.todolists.lock().await;
        if let Some(lists) = cache.get(project_id) {
            tracing::debug!(project_id, "todolists cache hit");
            return Ok(lists.clone());
        }

        let todoset = dock::find_tool_id(self.api.as_ref(), project_id, ToolKind::Todoset, None).await?;
        let listing = self
            .api
            .get_all(
                &format!("/buckets/{}/todosets/{}/todolists.json", project_id, todoset),
                &ListOptions::all(),
            )
            .await?;
        let lists: Vec<Todolist> = decode_all(listing.items)?;
        cache.insert(project_id.to_string(), lists.clone());
        Ok(lists)
    }

    pub async fn resolve_todolist(&self, token: &str, project_id: &str) -> Result<Resolved> {
        let token = token.trim();
        if token.is_empty() {
            return Err(BcqError::usage("Todolist name or ID required"));
        }
        if is_numeric_id(token) {
            return Ok(Resolved::passthrough(token));
        }
        let lists = self.todolists(project_id).await?;
        resolve_in("todolist", &lists, token, |l| l.id, |l| l.display_name())
    }
}

/// Parse a resolved numeric ID for request bodies.
pub fn parse_id(id: &str) -> Result<i64> {
    id.parse()
        .map_err(|_| BcqError::usage(format!("Invalid ID: {}", id)))
}
