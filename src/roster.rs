//! Guild and member data as pulled from Discord, plus the per-guild
//! resolution step that may fail without aborting the run.

use crate::logging::RunLog;
use serenity::all::{GuildId, Http, UserId};
use serenity::http::{HttpError, StatusCode};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::num::NonZeroU16;

/// Discord caps member list pages at 1000 entries.
const MEMBER_PAGE_LIMIT: u64 = 1000;

/// A member identifier: display name plus discriminator.  Display names are
/// not unique across Discord, so the discriminator disambiguates.  Accounts
/// migrated to unique usernames have no discriminator and use the bare name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MemberTag(String);

impl MemberTag {
    pub fn new(name: &str, discriminator: Option<NonZeroU16>) -> Self {
        match discriminator {
            Some(d) => Self(format!("{}#{:04}", name, d)),
            None => Self(name.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MemberTag {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Why a guild's member list could not be resolved.  Always recorded per
/// guild and never propagated; a guild that fails resolution is simply left
/// out of the computation.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("this guild cannot be chunked")]
    Rejected,
    #[error("access denied")]
    AccessDenied,
    #[error("{0}")]
    Other(String),
}

impl From<serenity::Error> for ResolveError {
    fn from(err: serenity::Error) -> Self {
        match err {
            serenity::Error::Http(HttpError::UnsuccessfulRequest(resp)) => {
                classify_status(resp.status_code)
            }
            serenity::Error::Http(_) => ResolveError::Rejected,
            other => ResolveError::Other(other.to_string()),
        }
    }
}

/// A 403 means the account lacks permission; any other rejected request
/// counts as Discord declining the bulk resolution.
fn classify_status(status: StatusCode) -> ResolveError {
    if status == StatusCode::FORBIDDEN {
        ResolveError::AccessDenied
    } else {
        ResolveError::Rejected
    }
}

/// The fields of a guild member this tool cares about.
pub struct RawMember {
    pub name: String,
    pub discriminator: Option<NonZeroU16>,
    pub bot: bool,
    pub avatar_url: Option<String>,
}

/// Everything collected from Discord in one run.  Icon and avatar references
/// live here as explicit side tables rather than hidden caches, keyed the
/// same way the membership map is.
#[derive(Default)]
pub struct GuildRoster {
    /// Guild name to member tags, bots and the account owner excluded.
    /// Guilds that failed to resolve are absent.
    pub membership: BTreeMap<String, BTreeSet<MemberTag>>,
    pub guild_icons: HashMap<String, Option<String>>,
    pub avatars: HashMap<MemberTag, Option<String>>,
    pub failures: Vec<(String, ResolveError)>,
}

impl GuildRoster {
    /// Resolve every guild's member list, sequentially, isolating failures
    /// per guild.  Progress and per-guild outcomes go to `log`.
    pub async fn collect(
        http: &Http,
        guild_ids: &[GuildId],
        owner: &MemberTag,
        log: &mut RunLog,
    ) -> Self {
        let mut roster = Self::default();

        for (idx, guild_id) in guild_ids.iter().enumerate() {
            let name = match guild_id.to_partial_guild(http).await {
                Ok(guild) => {
                    roster
                        .guild_icons
                        .insert(guild.name.clone(), guild.icon_url());
                    guild.name
                }
                // Can't even name the guild; report it by id.
                Err(e) => {
                    let name = format!("<guild-{}>", guild_id);
                    log.note(&format!(
                        "Error occurred while checking guild [{}]: {}",
                        name, e
                    ));
                    roster.failures.push((name, ResolveError::from(e)));
                    continue;
                }
            };

            log.note(&format!(
                "Processing guild {} [{}/{}]...",
                name,
                idx + 1,
                guild_ids.len()
            ));

            match resolve_members(http, *guild_id).await {
                Ok(members) => {
                    let tags =
                        filter_members(members, owner, &mut roster.avatars);
                    roster.membership.insert(name.clone(), tags);
                    log.note(&format!("Successfully processed guild [{}]", name));
                }
                Err(e @ ResolveError::Rejected) => {
                    log.note(&format!("This guild cannot be chunked: [{}]", name));
                    roster.failures.push((name, e));
                }
                Err(e @ ResolveError::AccessDenied) => {
                    log.note(&format!("Access denied to guild: [{}]", name));
                    roster.failures.push((name, e));
                }
                Err(e) => {
                    log.note(&format!(
                        "Error occurred while checking guild [{}]: {}",
                        name, e
                    ));
                    roster.failures.push((name, e));
                }
            }
        }

        roster
    }
}

/// Pull a guild's full member list via paginated HTTP requests.
async fn resolve_members(
    http: &Http,
    guild_id: GuildId,
) -> Result<Vec<RawMember>, ResolveError> {
    let mut members = Vec::new();
    let mut after: Option<UserId> = None;

    loop {
        let page = guild_id
            .members(http, Some(MEMBER_PAGE_LIMIT), after)
            .await?;
        let page_len = page.len();
        after = page.last().map(|m| m.user.id);

        members.extend(page.into_iter().map(|m| {
            let avatar_url = m.user.avatar_url();
            RawMember {
                name: m.user.name,
                discriminator: m.user.discriminator,
                bot: m.user.bot,
                avatar_url,
            }
        }));

        if page_len < MEMBER_PAGE_LIMIT as usize {
            return Ok(members);
        }
    }
}

/// Tag every member except bots and the owner, recording avatars alongside.
pub fn filter_members(
    members: impl IntoIterator<Item = RawMember>,
    owner: &MemberTag,
    avatars: &mut HashMap<MemberTag, Option<String>>,
) -> BTreeSet<MemberTag> {
    let mut tags = BTreeSet::new();

    for member in members {
        if member.bot {
            continue;
        }
        let tag = MemberTag::new(&member.name, member.discriminator);
        if &tag == owner {
            continue;
        }
        avatars.insert(tag.clone(), member.avatar_url);
        tags.insert(tag);
    }

    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn raw(name: &str, disc: u16, bot: bool) -> RawMember {
        RawMember {
            name: name.to_string(),
            discriminator: NonZeroU16::new(disc),
            bot,
            avatar_url: Some(format!("https://cdn.example/{}.png", name)),
        }
    }

    #[test]
    fn tag_includes_zero_padded_discriminator() {
        let tag = MemberTag::new("alice", NonZeroU16::new(42));
        assert_eq!(tag.as_str(), "alice#0042");
    }

    #[test]
    fn tag_for_migrated_account_is_bare_name() {
        let tag = MemberTag::new("alice", None);
        assert_eq!(tag.as_str(), "alice");
    }

    #[test]
    fn filter_drops_bots_and_owner() {
        let owner = MemberTag::new("me", NonZeroU16::new(1));
        let mut avatars = HashMap::new();
        let tags = filter_members(
            vec![
                raw("me", 1, false),
                raw("alice", 2, false),
                raw("beepboop", 3, true),
            ],
            &owner,
            &mut avatars,
        );

        assert_eq!(
            tags,
            BTreeSet::from([MemberTag::new("alice", NonZeroU16::new(2))])
        );
        // Avatars recorded only for retained members.
        assert_eq!(avatars.len(), 1);
    }

    #[test]
    fn forbidden_status_classifies_as_access_denied() {
        assert!(matches!(
            classify_status(StatusCode::FORBIDDEN),
            ResolveError::AccessDenied
        ));
    }

    #[test]
    fn other_http_statuses_classify_as_rejected() {
        for status in [
            StatusCode::BAD_REQUEST,
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::INTERNAL_SERVER_ERROR,
        ] {
            assert!(matches!(
                classify_status(status),
                ResolveError::Rejected
            ));
        }
    }

    #[test]
    fn non_request_http_error_classifies_as_rejected() {
        let err = serenity::Error::Http(HttpError::RateLimitI64F64);
        assert!(matches!(
            ResolveError::from(err),
            ResolveError::Rejected
        ));
    }

    #[test]
    fn non_http_error_classifies_as_other_with_message() {
        let err = serenity::Error::Other("gateway fell over");
        match ResolveError::from(err) {
            ResolveError::Other(msg) => {
                assert_eq!(msg, "gateway fell over")
            }
            other => panic!("expected Other, got {:?}", other),
        }
    }

    #[test]
    fn filter_keeps_same_name_different_discriminator() {
        let owner = MemberTag::new("me", NonZeroU16::new(1));
        let mut avatars = HashMap::new();
        let tags = filter_members(
            vec![raw("alice", 2, false), raw("alice", 3, false)],
            &owner,
            &mut avatars,
        );
        assert_eq!(tags.len(), 2);
    }
}
