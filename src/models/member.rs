//! Space membership.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use serde_with::skip_serializing_none;

use crate::entity::{Entity, Record, SpaceId, UserId};
use crate::error::{PodioError, Result};
use crate::session::Session;
use crate::traits::List;

/// Roles a member can be given in a space.
pub const MEMBER_ROLES: &[&str] = &["light", "regular", "admin"];

/// A user's membership in a space.
#[derive(Debug, Clone)]
pub struct Member {
    session: Session,
    user_id: u64,
    data: Record,
}

impl Entity for Member {
    const KIND: &'static str = "Member";

    fn from_record(session: Session, data: Record) -> Result<Self> {
        // Membership listings nest the user; invitations return it flat.
        let user_id = data
            .get("user_id")
            .or_else(|| data.get("user").and_then(|u| u.get("user_id")))
            .and_then(Value::as_u64)
            .ok_or(PodioError::MissingField {
                entity: Self::KIND,
                field: "user_id",
            })?;
        Ok(Self {
            session,
            user_id,
            data,
        })
    }

    fn session(&self) -> &Session {
        &self.session
    }

    fn data(&self) -> &Record {
        &self.data
    }

    fn into_record(self) -> Record {
        self.data
    }
}

impl Member {
    pub fn user_id(&self) -> UserId {
        UserId(self.user_id)
    }

    pub fn role(&self) -> Option<&str> {
        self.field_str("role")
    }

    /// Display name from the member's profile.
    pub fn name(&self) -> Option<&str> {
        self.field("profile")
            .and_then(|p| p.get("name"))
            .and_then(Value::as_str)
    }

    /// List the members of a space.
    #[tracing::instrument(skip(session, space))]
    pub async fn list_by_space(session: &Session, space: impl Into<SpaceId>) -> Result<Vec<Self>> {
        let space_id = space.into();
        let value: Value = session
            .get_json(&format!("/space/{space_id}/member/"))
            .await?;
        Self::from_values(session, value)
    }
}

impl From<&Member> for UserId {
    fn from(member: &Member) -> Self {
        member.user_id()
    }
}

#[async_trait]
impl List for Member {
    type Parent = SpaceId;
    type Query = ();

    async fn list(session: &Session, space: SpaceId, _query: &()) -> Result<Vec<Self>> {
        Self::list_by_space(session, space).await
    }
}

/// An invitation to join a space.
///
/// At least one of users, profiles, mails or external contacts must be
/// given.
///
/// ```
/// use podioapi::MemberInvite;
///
/// let invite = MemberInvite::new("regular", "Welcome aboard")
///     .user(7u64)
///     .mail("new.hire@example.com");
/// assert!(invite.validate().is_ok());
/// ```
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
pub struct MemberInvite {
    message: String,
    role: String,
    users: Option<Vec<UserId>>,
    profiles: Option<Vec<u64>>,
    mails: Option<Vec<String>>,
    /// Linked account id to the contacts to invite from it.
    external_contacts: Option<Record>,
    context_ref_type: Option<&'static str>,
    context_ref_id: Option<u64>,
    invite_context: Option<String>,
}

impl MemberInvite {
    pub fn new(role: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            role: role.into(),
            users: None,
            profiles: None,
            mails: None,
            external_contacts: None,
            context_ref_type: None,
            context_ref_id: None,
            invite_context: None,
        }
    }

    /// Invite an existing user, by id or [`Member`].
    #[must_use]
    pub fn user(mut self, user: impl Into<UserId>) -> Self {
        self.users.get_or_insert_with(Vec::new).push(user.into());
        self
    }

    #[must_use]
    pub fn users<I, U>(mut self, users: I) -> Self
    where
        I: IntoIterator<Item = U>,
        U: Into<UserId>,
    {
        self.users
            .get_or_insert_with(Vec::new)
            .extend(users.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn profile(mut self, profile_id: u64) -> Self {
        self.profiles.get_or_insert_with(Vec::new).push(profile_id);
        self
    }

    #[must_use]
    pub fn mail(mut self, address: impl Into<String>) -> Self {
        self.mails.get_or_insert_with(Vec::new).push(address.into());
        self
    }

    #[must_use]
    pub fn external_contacts(mut self, linked_account_id: u64, contacts: Vec<Value>) -> Self {
        self.external_contacts
            .get_or_insert_with(Record::new)
            .insert(linked_account_id.to_string(), Value::Array(contacts));
        self
    }

    /// Restrict the invitation to a single item instead of the whole space.
    #[must_use]
    pub fn item(mut self, item_id: u64) -> Self {
        self.context_ref_type = Some("item");
        self.context_ref_id = Some(item_id);
        self
    }

    /// Free text describing where the invitation was sent from.
    #[must_use]
    pub fn invite_context(mut self, context: impl Into<String>) -> Self {
        self.invite_context = Some(context.into());
        self
    }

    /// Check the role and that someone is being invited.
    ///
    /// # Errors
    ///
    /// Returns [`PodioError::Validation`] listing every problem found.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if !MEMBER_ROLES.contains(&self.role.as_str()) {
            errors.push(format!(
                "\"role\" should be one of: {}",
                MEMBER_ROLES.join(", ")
            ));
        }

        let has_invitee = self.users.as_ref().is_some_and(|v| !v.is_empty())
            || self.profiles.as_ref().is_some_and(|v| !v.is_empty())
            || self.mails.as_ref().is_some_and(|v| !v.is_empty())
            || self.external_contacts.as_ref().is_some_and(|v| !v.is_empty());
        if !has_invitee {
            errors.push(
                "at least one of \"users\", \"profiles\", \"mails\" or \"external_contacts\" is required"
                    .to_string(),
            );
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(PodioError::Validation(errors.join("\n")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Credentials;
    use serde_json::json;

    #[test]
    fn test_invite_body_key_order() {
        let invite = MemberInvite::new("admin", "join").user(7u64).item(12);
        let body = serde_json::to_string(&invite).unwrap();
        assert_eq!(
            body,
            r#"{"message":"join","role":"admin","users":[7],"context_ref_type":"item","context_ref_id":12}"#
        );
    }

    #[test]
    fn test_user_lists_are_kept() {
        let invite = MemberInvite::new("regular", "hi").users([1u64, 2, 3]);
        assert_eq!(
            serde_json::to_value(&invite).unwrap()["users"],
            json!([1, 2, 3])
        );
    }

    #[test]
    fn test_invalid_role_and_no_invitee() {
        let err = MemberInvite::new("owner", "hi").validate().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("light, regular, admin"));
        assert!(msg.contains("at least one of"));
    }

    #[test]
    fn test_member_id_from_nested_user() {
        let session = Session::new(Credentials::new("id", "secret")).unwrap();
        let member = Member::from_value(
            &session,
            json!({"user": {"user_id": 7}, "role": "admin", "profile": {"name": "Ada"}}),
        )
        .unwrap();

        assert_eq!(UserId::from(&member), UserId(7));
        assert_eq!(member.role(), Some("admin"));
        assert_eq!(member.name(), Some("Ada"));
    }
}
