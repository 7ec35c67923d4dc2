use super::Table;
use crate::error::{CellgenError, Result};
use crate::host::{RowSelection, TableHost};
use cellgen_engine::engine::{
    Field, FieldId, FieldKind, PromptOptions, Row, RowId, Value, dependency_ids, detect_cycle,
    evaluation_order, expand_template, extract_placeholders, find_field_by_name,
};
use tracing::{debug, warn};

impl Table {
    /// Recompute every computed field reading `changed` for `rows`, in
    /// dependency order, each field at most once.
    pub(crate) fn propagate(&mut self, changed: &[FieldId], rows: RowSelection) -> Result<()> {
        let affected = self.transitive_dependants(changed);
        if affected.is_empty() {
            return Ok(());
        }

        let ctx = Table::context(self.backend.as_ref(), self.batch_size);
        for id in evaluation_order(&self.store.fields) {
            if !affected.contains(&id) {
                continue;
            }
            let Some(field) = self.store.field(id).cloned() else {
                continue;
            };
            let Some(field_type) = self.registry.for_kind(&field.kind) else {
                continue;
            };
            field_type.row_of_dependency_updated(&field, rows.clone(), &mut self.store, &ctx)?;
        }
        Ok(())
    }

    /// Every placeholder of a prompt must name an existing field.
    fn check_placeholders(&self, field: &Field) -> Result<()> {
        if let FieldKind::Prompt(opts) = &field.kind {
            for name in extract_placeholders(&opts.prompt) {
                if find_field_by_name(&self.store.fields, &name).is_none() {
                    warn!(field = %field.name, placeholder = %name, "prompt names an unknown field");
                    return Err(CellgenError::UnknownField(name));
                }
            }
        }
        Ok(())
    }

    fn check_name(&self, name: &str, except: Option<FieldId>) -> Result<()> {
        if name.is_empty() {
            return Err(CellgenError::InvalidField {
                field: name.to_string(),
                reason: "name must not be blank".to_string(),
            });
        }
        // Prompts reference fields as `{name}`.
        if name.contains(['{', '}']) {
            return Err(CellgenError::InvalidField {
                field: name.to_string(),
                reason: "name must not contain '{' or '}'".to_string(),
            });
        }
        if self
            .store
            .fields
            .iter()
            .any(|f| f.name == name && Some(f.id) != except)
        {
            return Err(CellgenError::DuplicateField(name.to_string()));
        }
        Ok(())
    }

    /// Add a field. Computed fields are validated, checked for cycles and
    /// populated for every existing row before this returns.
    pub fn add_field(&mut self, name: &str, kind: FieldKind) -> Result<FieldId> {
        let name = name.trim();
        self.check_name(name, None)?;

        let id = FieldId(self.next_field_id);
        let field = Field::new(id, name, kind);
        if let Some(field_type) = self.registry.for_kind(&field.kind) {
            field_type.validate(&field, &self.store.fields)?;
        }
        self.check_placeholders(&field)?;

        self.store.fields.push(field.clone());
        if detect_cycle(id, &self.store.fields).is_some() {
            self.store.fields.pop();
            return Err(CellgenError::CircularDependency);
        }
        self.next_field_id += 1;
        self.rebuild_dependants();

        if let Some(field_type) = self.registry.for_kind(&field.kind) {
            let ctx = Table::context(self.backend.as_ref(), self.batch_size);
            if let Err(e) = field_type.after_create(&field, &mut self.store, &ctx) {
                // Creation is all or nothing: drop the field and any chunks already written.
                self.store.fields.retain(|f| f.id != id);
                self.store.clear_column(id);
                self.rebuild_dependants();
                return Err(e);
            }
        }

        debug!(field = %id, name = %field.name, kind = field.kind.type_name(), "added field");
        Ok(id)
    }

    /// Reconfigure a field. Computed fields whose inputs changed are
    /// recomputed for every row, then their dependants follow.
    pub fn update_field(&mut self, id: FieldId, kind: FieldKind) -> Result<()> {
        let index = self.store.field_index(id)?;
        let old = self.store.fields[index].clone();
        let new = Field::new(id, &old.name, kind);

        if let Some(field_type) = self.registry.for_kind(&new.kind) {
            field_type.validate(&new, &self.store.fields)?;
        }
        self.check_placeholders(&new)?;

        self.store.fields[index] = new.clone();
        if detect_cycle(id, &self.store.fields).is_some() {
            self.store.fields[index] = old;
            return Err(CellgenError::CircularDependency);
        }
        self.rebuild_dependants();

        // A failed recompute puts the column back as it was.
        let snapshot: Vec<(RowId, Value)> = self
            .store
            .rows
            .iter()
            .map(|row| (row.id, row.get(id).clone()))
            .collect();

        let recomputed = match self.registry.for_kind(&new.kind) {
            Some(field_type) => {
                let ctx = Table::context(self.backend.as_ref(), self.batch_size);
                let result = if old.kind.type_name() == new.kind.type_name() {
                    field_type.after_update(&old, &new, &mut self.store, &ctx)
                } else {
                    field_type.after_create(&new, &mut self.store, &ctx)
                };
                match result {
                    Ok(n) => n,
                    Err(e) => {
                        self.store.bulk_update(id, snapshot)?;
                        self.store.fields[index] = old;
                        self.rebuild_dependants();
                        return Err(e);
                    }
                }
            }
            None => 0,
        };

        if recomputed > 0 {
            self.propagate(&[id], RowSelection::All)?;
        }
        Ok(())
    }

    /// Rename a field, rewriting prompt placeholders that named it.
    pub fn rename_field(&mut self, id: FieldId, name: &str) -> Result<()> {
        let name = name.trim();
        let index = self.store.field_index(id)?;
        self.check_name(name, Some(id))?;

        let old_name = std::mem::replace(&mut self.store.fields[index].name, name.to_string());
        for field in self.store.fields.iter_mut() {
            let FieldKind::Prompt(opts) = &field.kind else {
                continue;
            };
            if !extract_placeholders(&opts.prompt).contains(&old_name) {
                continue;
            }
            let prompt = expand_template(&opts.prompt, |placeholder| {
                let target = if placeholder == old_name { name } else { placeholder };
                Some(format!("{{{}}}", target))
            })?;
            field.kind = FieldKind::Prompt(PromptOptions { prompt });
        }

        self.rebuild_dependants();
        Ok(())
    }

    /// Delete a field and its column. Translations reading it lose their
    /// source; prompts naming it keep the field alive.
    pub fn delete_field(&mut self, id: FieldId) -> Result<()> {
        let index = self.store.field_index(id)?;
        let name = self.store.fields[index].name.clone();

        if let Some(prompt) = self.store.fields.iter().find(|f| {
            f.id != id
                && matches!(f.kind, FieldKind::Prompt(_))
                && dependency_ids(f, &self.store.fields).contains(&id)
        }) {
            return Err(CellgenError::FieldInUse {
                field: name,
                by: prompt.name.clone(),
            });
        }

        self.store.fields.remove(index);
        self.store.clear_column(id);

        let mut orphaned = Vec::new();
        for field in self.store.fields.iter_mut() {
            if let FieldKind::Translation(opts) = &mut field.kind
                && opts.source_field_id == Some(id)
            {
                opts.source_field_id = None;
                orphaned.push(field.id);
            }
        }

        self.rebuild_dependants();

        // Sources are gone, so these columns now compute to empty.
        let ctx = Table::context(self.backend.as_ref(), self.batch_size);
        for field_id in &orphaned {
            let Some(field) = self.store.field(*field_id).cloned() else {
                continue;
            };
            if let Some(field_type) = self.registry.for_kind(&field.kind) {
                field_type.recompute_column(&field, &mut self.store, &ctx)?;
            }
        }
        if !orphaned.is_empty() {
            self.propagate(&orphaned, RowSelection::All)?;
        }
        Ok(())
    }

    /// Resolve user-supplied `(field name, value)` pairs to writable fields.
    fn resolve_values<S: AsRef<str>>(
        &self,
        values: impl IntoIterator<Item = (S, Value)>,
    ) -> Result<Vec<(FieldId, Value)>> {
        values
            .into_iter()
            .map(|(name, value)| {
                let name = name.as_ref();
                let field = self
                    .field_by_name(name)
                    .ok_or_else(|| CellgenError::UnknownField(name.to_string()))?;
                if field.is_computed() {
                    return Err(CellgenError::ReadOnlyField(name.to_string()));
                }
                Ok((field.id, value))
            })
            .collect()
    }

    /// Create several rows in one call. Every computed field is populated
    /// for the new rows before this returns; on failure no row is kept.
    pub fn create_rows<R, S>(&mut self, rows: impl IntoIterator<Item = R>) -> Result<Vec<RowId>>
    where
        R: IntoIterator<Item = (S, Value)>,
        S: AsRef<str>,
    {
        let resolved: Vec<Vec<(FieldId, Value)>> = rows
            .into_iter()
            .map(|values| self.resolve_values(values))
            .collect::<Result<_>>()?;
        if resolved.is_empty() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::with_capacity(resolved.len());
        for values in resolved {
            let mut row = Row::new(RowId(self.next_row_id));
            self.next_row_id += 1;
            for (field, value) in values {
                row.set(field, value);
            }
            ids.push(row.id);
            self.store.rows.insert(row.id, row);
        }

        let notified = self.store.notifications.len();
        let ctx = Table::context(self.backend.as_ref(), self.batch_size);
        for id in evaluation_order(&self.store.fields) {
            let Some(field) = self.store.field(id).cloned() else {
                continue;
            };
            let Some(field_type) = self.registry.for_kind(&field.kind) else {
                continue;
            };
            let selection = RowSelection::Many(ids.clone());
            if let Err(e) = field_type.row_of_dependency_updated(&field, selection, &mut self.store, &ctx) {
                for row in &ids {
                    self.store.rows.remove(row);
                }
                self.store.notifications.truncate(notified);
                return Err(e);
            }
        }

        debug!(rows = ids.len(), "created rows");
        Ok(ids)
    }

    /// Create one row. See [`Table::create_rows`].
    pub fn create_row<S: AsRef<str>>(
        &mut self,
        values: impl IntoIterator<Item = (S, Value)>,
    ) -> Result<RowId> {
        let values: Vec<(S, Value)> = values.into_iter().collect();
        let ids = self.create_rows([values])?;
        // One input row, one id.
        Ok(ids[0])
    }

    /// Write user values into one row and recompute only that row of the
    /// computed fields that read them.
    pub fn update_row<S: AsRef<str>>(
        &mut self,
        id: RowId,
        values: impl IntoIterator<Item = (S, Value)>,
    ) -> Result<()> {
        if !self.store.rows.contains_key(&id) {
            return Err(CellgenError::UnknownRow(id));
        }
        let resolved = self.resolve_values(values)?;

        let mut edited = Vec::with_capacity(resolved.len());
        if let Some(mut row) = self.store.rows.get_mut(&id) {
            for (field, value) in resolved {
                row.set(field, value);
                edited.push(field);
            }
        }

        self.propagate(&edited, RowSelection::Single(id))
    }

    /// Parse user input (see [`Value::from_input`]) into one cell.
    pub fn set_cell_from_input(&mut self, id: RowId, field_name: &str, input: &str) -> Result<()> {
        self.update_row(id, [(field_name, Value::from_input(input))])
    }

    pub fn delete_row(&mut self, id: RowId) -> Result<()> {
        self.store
            .rows
            .remove(&id)
            .map(|_| ())
            .ok_or(CellgenError::UnknownRow(id))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Table;
    use crate::error::CellgenError;
    use crate::field_types::testing::CountingBackend;
    use crate::host::Notification;
    use cellgen_engine::compute::StubBackend;
    use cellgen_engine::engine::{FieldKind, PromptOptions, RowId, TranslationOptions, Value};

    fn translation(source: Option<cellgen_engine::engine::FieldId>, to: &str) -> FieldKind {
        FieldKind::Translation(TranslationOptions {
            source_field_id: source,
            source_language: "en".to_string(),
            target_language: to.to_string(),
        })
    }

    fn prompt(template: &str) -> FieldKind {
        FieldKind::Prompt(PromptOptions {
            prompt: template.to_string(),
        })
    }

    #[test]
    fn test_add_field_rejects_duplicate_names() {
        let mut table = Table::new(Box::new(StubBackend));
        table.add_field("English", FieldKind::Text).unwrap();
        let result = table.add_field(" English ", FieldKind::Text);
        assert!(matches!(result, Err(CellgenError::DuplicateField(_))));
    }

    #[test]
    fn test_self_referencing_prompt_is_rejected() {
        let mut table = Table::new(Box::new(StubBackend));
        table.add_field("Source", FieldKind::Text).unwrap();

        // A new prompt cannot name itself (the name doesn't exist yet),
        // but reconfiguring an existing one can.
        let out = table.add_field("Out", prompt("{Source}")).unwrap();
        let result = table.update_field(out, prompt("{Out} {Source}"));
        assert!(matches!(result, Err(CellgenError::CircularDependency)));
        assert!(matches!(
            &table.field(out).unwrap().kind,
            FieldKind::Prompt(opts) if opts.prompt == "{Source}"
        ));
    }

    #[test]
    fn test_add_prompt_with_unknown_placeholder_is_rejected() {
        let mut table = Table::new(Box::new(StubBackend));
        let result = table.add_field("Out", prompt("Say {Nope}"));
        assert!(matches!(result, Err(CellgenError::UnknownField(ref n)) if n == "Nope"));
        assert!(table.fields().is_empty());
    }

    #[test]
    fn test_computed_cells_are_read_only() {
        let mut table = Table::new(Box::new(StubBackend));
        let english = table.add_field("English", FieldKind::Text).unwrap();
        table.add_field("French", translation(Some(english), "fr")).unwrap();
        let row = table.create_row([("English", Value::text("Hi"))]).unwrap();

        let result = table.update_row(row, [("French", Value::text("Salut"))]);
        assert!(matches!(result, Err(CellgenError::ReadOnlyField(_))));
        assert_eq!(
            table.cell(row, "French").unwrap(),
            Value::text("translation (en to fr): Hi")
        );
    }

    #[test]
    fn test_failed_creation_rolls_back_field_and_column() {
        let backend = CountingBackend::failing_on("boom");
        let mut table = Table::new(Box::new(backend)).with_batch_size(1);
        let english = table.add_field("English", FieldKind::Text).unwrap();
        // No computed fields yet, so rows are created without backend calls.
        table
            .create_rows([[("English", Value::text("ok"))], [("English", Value::text("boom"))]])
            .unwrap();

        let result = table.add_field("French", translation(Some(english), "fr"));
        assert!(matches!(result, Err(CellgenError::Compute(_))));
        assert!(table.field_by_name("French").is_none());
        for row in table.row_ids() {
            assert_eq!(table.store.rows.get(&row).unwrap().cells.len(), 1);
        }
        assert!(table.notifications().is_empty());
    }

    #[test]
    fn test_failed_batch_creation_keeps_no_rows() {
        let backend = CountingBackend::failing_on("boom");
        let mut table = Table::new(Box::new(backend));
        let english = table.add_field("English", FieldKind::Text).unwrap();
        table.add_field("French", translation(Some(english), "fr")).unwrap();

        let result = table.create_rows([
            [("English", Value::text("fine"))],
            [("English", Value::text("boom"))],
        ]);
        assert!(matches!(result, Err(CellgenError::Compute(_))));
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn test_failed_update_restores_written_chunks() {
        let backend = CountingBackend::failing_on("boom");
        let mut table = Table::new(Box::new(backend)).with_batch_size(1);
        let english = table.add_field("English", FieldKind::Text).unwrap();
        let spanish = table.add_field("Spanish", FieldKind::Text).unwrap();
        table
            .create_rows([
                [("English", Value::text("a")), ("Spanish", Value::text("uno"))],
                [("English", Value::text("b")), ("Spanish", Value::text("boom"))],
            ])
            .unwrap();
        let french = table.add_field("French", translation(Some(english), "fr")).unwrap();
        table.take_notifications();

        let result = table.update_field(french, translation(Some(spanish), "fr"));
        assert!(matches!(result, Err(CellgenError::Compute(_))));

        assert_eq!(
            table.field(french).unwrap().kind,
            translation(Some(english), "fr")
        );
        assert_eq!(
            table.cell(RowId(1), "French").unwrap(),
            Value::text("translation (en to fr): a")
        );
        assert_eq!(
            table.cell(RowId(2), "French").unwrap(),
            Value::text("translation (en to fr): b")
        );
        assert!(table.notifications().is_empty());
    }

    #[test]
    fn test_failed_batch_creation_drops_its_notifications() {
        let backend = CountingBackend::failing_on("Check translation (en to fr): boom");
        let mut table = Table::new(Box::new(backend));
        let english = table.add_field("English", FieldKind::Text).unwrap();
        table.add_field("French", translation(Some(english), "fr")).unwrap();
        table.add_field("Summary", prompt("Check {French}")).unwrap();
        table.take_notifications();

        let result = table.create_row([("English", Value::text("boom"))]);
        assert!(matches!(result, Err(CellgenError::Compute(_))));
        assert_eq!(table.row_count(), 0);
        assert!(table.notifications().is_empty());
    }

    #[test]
    fn test_field_names_with_braces_are_rejected() {
        let mut table = Table::new(Box::new(StubBackend));
        let english = table.add_field("English", FieldKind::Text).unwrap();
        let out = table.add_field("Out", prompt("Say {English}")).unwrap();

        let result = table.add_field("a{b", FieldKind::Text);
        assert!(matches!(result, Err(CellgenError::InvalidField { .. })));

        let result = table.rename_field(english, "Eng}lish");
        assert!(matches!(result, Err(CellgenError::InvalidField { .. })));
        assert_eq!(table.field(out).unwrap().kind, prompt("Say {English}"));
        assert!(table.dependants[&english].contains(&out));

        let row = table.create_row([("English", Value::text("hi"))]).unwrap();
        assert_eq!(table.cell(row, "Out").unwrap(), Value::text("chatgpt: Say hi"));
    }

    #[test]
    fn test_rename_rewrites_prompt_placeholders() {
        let mut table = Table::new(Box::new(StubBackend));
        let english = table.add_field("English", FieldKind::Text).unwrap();
        let out = table.add_field("Out", prompt("Say { English } twice: {English}")).unwrap();

        table.rename_field(english, "Source").unwrap();

        match &table.field(out).unwrap().kind {
            FieldKind::Prompt(opts) => assert_eq!(opts.prompt, "Say {Source} twice: {Source}"),
            other => panic!("Expected prompt, got {:?}", other),
        }
        assert!(table.dependants[&english].contains(&out));

        let row = table.create_row([("Source", Value::text("hey"))]).unwrap();
        assert_eq!(
            table.cell(row, "Out").unwrap(),
            Value::text("chatgpt: Say hey twice: hey")
        );
    }

    #[test]
    fn test_delete_source_unsets_translation_and_clears_cells() {
        let mut table = Table::new(Box::new(StubBackend));
        let english = table.add_field("English", FieldKind::Text).unwrap();
        let french = table.add_field("French", translation(Some(english), "fr")).unwrap();
        let row = table.create_row([("English", Value::text("Hi"))]).unwrap();

        table.delete_field(english).unwrap();

        match &table.field(french).unwrap().kind {
            FieldKind::Translation(opts) => assert_eq!(opts.source_field_id, None),
            other => panic!("Expected translation, got {:?}", other),
        }
        assert_eq!(table.cell(row, "French").unwrap(), Value::Empty);
        assert!(table.dependants.is_empty());
    }

    #[test]
    fn test_delete_field_named_by_prompt_is_rejected() {
        let mut table = Table::new(Box::new(StubBackend));
        let english = table.add_field("English", FieldKind::Text).unwrap();
        table.add_field("Out", prompt("{English}")).unwrap();

        let result = table.delete_field(english);
        assert!(matches!(result, Err(CellgenError::FieldInUse { ref by, .. }) if by == "Out"));
        assert!(table.field(english).is_some());
    }

    #[test]
    fn test_update_unknown_row_fails() {
        let mut table = Table::new(Box::new(StubBackend));
        table.add_field("English", FieldKind::Text).unwrap();
        let result = table.set_cell_from_input(RowId(42), "English", "x");
        assert!(matches!(result, Err(CellgenError::UnknownRow(RowId(42)))));
    }

    #[test]
    fn test_switching_plain_field_to_translation_populates_it() {
        let mut table = Table::new(Box::new(StubBackend));
        let english = table.add_field("English", FieldKind::Text).unwrap();
        let notes = table.add_field("Notes", FieldKind::Text).unwrap();
        let row = table.create_row([("English", Value::text("Hi"))]).unwrap();
        table.take_notifications();

        table.update_field(notes, translation(Some(english), "de")).unwrap();

        assert_eq!(
            table.cell(row, "Notes").unwrap(),
            Value::text("translation (en to de): Hi")
        );
        assert_eq!(table.notifications(), &[Notification::TableRefreshed]);
    }

    #[test]
    fn test_delete_row() {
        let mut table = Table::new(Box::new(StubBackend));
        table.add_field("English", FieldKind::Text).unwrap();
        let row = table.create_row([("English", Value::text("Hi"))]).unwrap();
        table.delete_row(row).unwrap();
        assert_eq!(table.row_count(), 0);
        assert!(matches!(table.delete_row(row), Err(CellgenError::UnknownRow(_))));
    }
}
