//! In-memory [`DiscussionStore`] double shared by the unit tests.

use std::{convert::Infallible, sync::Mutex};

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::{
  discussion::{
    Comment, Discussion, DiscussionType, NewComment, NewDiscussion, Resolution, UserId,
  },
  store::{DiscussionFilter, DiscussionPage, DiscussionQuery, DiscussionStore, ForumStore},
};

#[derive(Default)]
pub struct MemoryStore {
  discussions: Mutex<Vec<Discussion>>,
}

impl MemoryStore {
  /// Insert a discussion directly, `age_minutes` in the past.
  pub fn seed(&self, kind: Option<DiscussionType>, author: UserId, age_minutes: i64) -> Uuid {
    let discussion = Discussion {
      discussion_id:     Uuid::new_v4(),
      kind,
      name:              "Seeded".into(),
      body:              "body".into(),
      insert_user_id:    author,
      date_inserted:     Utc::now() - Duration::minutes(age_minutes),
      date_last_comment: None,
      count_comments:    0,
      resolution:        Resolution::Unresolved,
    };
    let id = discussion.discussion_id;
    self.discussions.lock().unwrap().push(discussion);
    id
  }

  pub fn get(&self, id: Uuid) -> Option<Discussion> {
    self
      .discussions
      .lock()
      .unwrap()
      .iter()
      .find(|d| d.discussion_id == id)
      .cloned()
  }

  fn matching(&self, filter: &DiscussionFilter) -> Vec<Discussion> {
    let mut hits: Vec<Discussion> = self
      .discussions
      .lock()
      .unwrap()
      .iter()
      .filter(|d| filter.matches(d))
      .cloned()
      .collect();
    hits.sort_by_key(|d| std::cmp::Reverse(d.last_activity()));
    hits
  }
}

impl DiscussionStore for MemoryStore {
  type Error = Infallible;

  async fn get_discussion(&self, id: Uuid) -> Result<Option<Discussion>, Infallible> {
    Ok(self.get(id))
  }

  async fn set_resolution(&self, id: Uuid, resolution: Resolution) -> Result<bool, Infallible> {
    let mut discussions = self.discussions.lock().unwrap();
    match discussions.iter_mut().find(|d| d.discussion_id == id) {
      Some(d) => {
        d.resolution = resolution;
        Ok(true)
      }
      None => Ok(false),
    }
  }

  async fn query_discussions(&self, query: &DiscussionQuery) -> Result<DiscussionPage, Infallible> {
    let hits = self.matching(&query.filter);
    let total = hits.len() as u64;
    let items = hits.into_iter().skip(query.offset).take(query.limit).collect();
    Ok(DiscussionPage { items, total })
  }

  async fn count_discussions(&self, filter: &DiscussionFilter) -> Result<u64, Infallible> {
    Ok(self.matching(filter).len() as u64)
  }
}

impl ForumStore for MemoryStore {
  async fn create_discussion(&self, input: NewDiscussion) -> Result<Discussion, Infallible> {
    let discussion = Discussion {
      discussion_id:     Uuid::new_v4(),
      kind:              input.kind,
      name:              input.name,
      body:              input.body,
      insert_user_id:    input.insert_user_id,
      date_inserted:     Utc::now(),
      date_last_comment: None,
      count_comments:    0,
      resolution:        Resolution::Unresolved,
    };
    self.discussions.lock().unwrap().push(discussion.clone());
    Ok(discussion)
  }

  async fn add_comment(&self, input: NewComment) -> Result<Option<Comment>, Infallible> {
    let comment = Comment {
      comment_id:     Uuid::new_v4(),
      discussion_id:  input.discussion_id,
      insert_user_id: input.insert_user_id,
      body:           input.body,
      date_inserted:  Utc::now(),
    };
    let mut discussions = self.discussions.lock().unwrap();
    let Some(d) = discussions
      .iter_mut()
      .find(|d| d.discussion_id == input.discussion_id)
    else {
      return Ok(None);
    };
    d.date_last_comment = Some(comment.date_inserted);
    d.count_comments += 1;
    Ok(Some(comment))
  }
}
