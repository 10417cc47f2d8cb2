use crate::core::domain::id_at_position;
use crate::core::library::{LibraryError, LibraryResult};
use crate::members::domain::model::MemberEntity;

// MemberRegistry owns every registered member, insertion-order preserved so
// the console's numbered member list is deterministic.
#[derive(Debug, Default)]
pub struct MemberRegistry {
    members: Vec<MemberEntity>,
}

impl MemberRegistry {
    pub fn new() -> Self {
        Self { members: Vec::new() }
    }

    pub(crate) fn from_members(members: Vec<MemberEntity>) -> Self {
        Self { members }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn search(&self, member_id: &str) -> Option<&MemberEntity> {
        self.members.iter().find(|member| member.member_id == member_id)
    }

    pub(crate) fn search_mut(&mut self, member_id: &str) -> Option<&mut MemberEntity> {
        self.members.iter_mut().find(|member| member.member_id == member_id)
    }

    pub fn insert_member(&mut self, member: MemberEntity) -> LibraryResult<()> {
        if self.search(member.member_id.as_str()).is_some() {
            return Err(LibraryError::already_exists(
                format!("member with id {} already registered", member.member_id).as_str()));
        }
        self.members.push(member);
        Ok(())
    }

    pub fn members(&self) -> impl Iterator<Item = &MemberEntity> {
        self.members.iter()
    }

    pub fn member_id_at<'a>(position: usize, members: impl Iterator<Item = &'a MemberEntity>) -> Option<String> {
        id_at_position(position, members)
    }
}
