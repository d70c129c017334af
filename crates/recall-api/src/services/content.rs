//! Notes and todos, personal or shared in a room.

use uuid::Uuid;

use recall_core::{
    authorize_room, can_delete_content, can_update_content, ContentRef, CreateNoteRequest,
    CreateTodoRequest, Error, Note, Principal, Result, RoomAction, RoomRole, Store, Todo,
    UpdateNoteRequest, UpdateTodoRequest,
};

use super::rooms::normalize_optional;

/// Note and todo operations with creator/room access rules.
#[derive(Clone)]
pub struct ContentService {
    store: Store,
}

impl ContentService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Gate a room-scoped read or create. `None` means personal scope.
    async fn check_room(
        &self,
        principal: &Principal,
        room_id: Option<Uuid>,
        action: RoomAction,
    ) -> Result<()> {
        if let Some(room_id) = room_id {
            let membership = self.store.room_role(principal, room_id).await?;
            authorize_room(membership, action)?;
        }
        Ok(())
    }

    /// The caller's role in the room the content lives in, if any.
    async fn membership_for(
        &self,
        principal: &Principal,
        content: &ContentRef,
    ) -> Result<Option<RoomRole>> {
        match content.room_id {
            Some(room_id) => self.store.room_role(principal, room_id).await,
            None => Ok(None),
        }
    }

    // ── Notes ──────────────────────────────────────────────────────────────

    pub async fn list_notes(
        &self,
        principal: &Principal,
        room_id: Option<Uuid>,
    ) -> Result<Vec<Note>> {
        self.check_room(principal, room_id, RoomAction::Read)
            .await?;
        match room_id {
            Some(room_id) => self.store.notes.list_for_room(room_id).await,
            None => self.store.notes.list_personal(principal.user_id).await,
        }
    }

    pub async fn create_note(
        &self,
        principal: &Principal,
        room_id: Option<Uuid>,
        title: Option<String>,
        content: &str,
    ) -> Result<Note> {
        let content = required_text(content, "content")?;
        self.check_room(principal, room_id, RoomAction::CreateContent)
            .await?;
        self.store
            .notes
            .insert(CreateNoteRequest {
                user_id: principal.user_id,
                room_id,
                title: normalize_optional(title),
                content,
            })
            .await
    }

    pub async fn update_note(
        &self,
        principal: &Principal,
        id: Uuid,
        mut req: UpdateNoteRequest,
    ) -> Result<Note> {
        if let Some(content) = req.content.take() {
            req.content = Some(required_text(&content, "content")?);
        }
        if let Some(title) = req.title.take() {
            req.title = Some(normalize_optional(title));
        }

        let note = self.require_note(id).await?;
        let content = ContentRef {
            creator_id: note.user_id,
            room_id: note.room_id,
        };
        let membership = self.membership_for(principal, &content).await?;
        if !can_update_content(principal, &content, membership) {
            return Err(Error::Forbidden(
                "You cannot edit this note".to_string(),
            ));
        }
        self.store.notes.update(id, req).await
    }

    pub async fn delete_note(&self, principal: &Principal, id: Uuid) -> Result<()> {
        let note = self.require_note(id).await?;
        let content = ContentRef {
            creator_id: note.user_id,
            room_id: note.room_id,
        };
        let membership = self.membership_for(principal, &content).await?;
        if !can_delete_content(principal, &content, membership) {
            return Err(Error::Forbidden(
                "Only the author or a room admin can delete this note".to_string(),
            ));
        }
        self.store.notes.delete(id).await?;
        Ok(())
    }

    async fn require_note(&self, id: Uuid) -> Result<Note> {
        self.store
            .notes
            .get(id)
            .await?
            .ok_or_else(|| Error::NotFound("Note not found".to_string()))
    }

    // ── Todos ──────────────────────────────────────────────────────────────

    pub async fn list_todos(
        &self,
        principal: &Principal,
        room_id: Option<Uuid>,
    ) -> Result<Vec<Todo>> {
        self.check_room(principal, room_id, RoomAction::Read)
            .await?;
        match room_id {
            Some(room_id) => self.store.todos.list_for_room(room_id).await,
            None => self.store.todos.list_personal(principal.user_id).await,
        }
    }

    pub async fn create_todo(
        &self,
        principal: &Principal,
        room_id: Option<Uuid>,
        task: &str,
    ) -> Result<Todo> {
        let task = required_text(task, "task")?;
        self.check_room(principal, room_id, RoomAction::CreateContent)
            .await?;
        self.store
            .todos
            .insert(CreateTodoRequest {
                user_id: principal.user_id,
                room_id,
                task,
            })
            .await
    }

    pub async fn update_todo(
        &self,
        principal: &Principal,
        id: Uuid,
        mut req: UpdateTodoRequest,
    ) -> Result<Todo> {
        if let Some(task) = req.task.take() {
            req.task = Some(required_text(&task, "task")?);
        }

        let todo = self.require_todo(id).await?;
        let content = ContentRef {
            creator_id: todo.user_id,
            room_id: todo.room_id,
        };
        let membership = self.membership_for(principal, &content).await?;
        if !can_update_content(principal, &content, membership) {
            return Err(Error::Forbidden(
                "You cannot edit this todo".to_string(),
            ));
        }
        self.store.todos.update(id, req).await
    }

    pub async fn delete_todo(&self, principal: &Principal, id: Uuid) -> Result<()> {
        let todo = self.require_todo(id).await?;
        let content = ContentRef {
            creator_id: todo.user_id,
            room_id: todo.room_id,
        };
        let membership = self.membership_for(principal, &content).await?;
        if !can_delete_content(principal, &content, membership) {
            return Err(Error::Forbidden(
                "Only the author or a room admin can delete this todo".to_string(),
            ));
        }
        self.store.todos.delete(id).await?;
        Ok(())
    }

    async fn require_todo(&self, id: Uuid) -> Result<Todo> {
        self.store
            .todos
            .get(id)
            .await?
            .ok_or_else(|| Error::NotFound("Todo not found".to_string()))
    }
}

/// Trimmed non-empty text, else `InvalidInput` naming the field.
fn required_text(value: &str, field: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::InvalidInput(format!("{} is required", field)));
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text() {
        assert_eq!(required_text("  buy milk ", "task").unwrap(), "buy milk");
        let err = required_text(" \n", "content").unwrap_err();
        assert_eq!(err.to_string(), "Invalid input: content is required");
    }
}
