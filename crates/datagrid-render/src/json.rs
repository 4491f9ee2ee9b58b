//! JSON renderer for client-side grids

use datagrid_core::{ID_CONCATED, Result, Value};
use serde_json::{Map, json};

use crate::{RenderContext, RenderOutput, Renderer};

pub const JSON: &str = "json";

#[derive(Debug, Default, Clone, Copy)]
pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn name(&self) -> &'static str {
        JSON
    }

    fn render(&self, context: &RenderContext) -> Result<RenderOutput> {
        let columns = context.visible_columns();

        let rows: Vec<serde_json::Value> = context
            .rows
            .iter()
            .map(|row| {
                let mut object = Map::new();
                if let Some(id) = row.get(ID_CONCATED) {
                    object.insert(ID_CONCATED.to_string(), id.to_json());
                }
                for column in &columns {
                    let value = row.get(column.unique_id()).unwrap_or(&Value::Null);
                    object.insert(column.unique_id().to_string(), value.to_json());
                }
                serde_json::Value::Object(object)
            })
            .collect();

        let columns: Vec<serde_json::Value> = columns
            .iter()
            .map(|column| {
                json!({
                    "id": column.unique_id(),
                    "label": column.label,
                    "sortable": column.sortable,
                    "filterable": column.filterable,
                })
            })
            .collect();

        let document = json!({
            "page": context.page,
            "pages": context.page_count(),
            "total": context.total,
            "records": rows.len(),
            "columns": columns,
            "rows": rows,
        });

        Ok(RenderOutput::new(
            "application/json",
            serde_json::to_string(&document)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use datagrid_core::{Column, PreparedRow};
    use pretty_assertions::assert_eq;

    #[test]
    fn writes_page_metadata_and_rows() {
        let mut row = PreparedRow::new();
        row.insert("vol".into(), Value::Int64(85));
        row.insert(ID_CONCATED.into(), Value::from("3"));

        let context = RenderContext {
            columns: vec![Arc::new(Column::select("vol", None).with_label("Volume"))],
            rows: vec![row],
            total: 30,
            page: 2,
            items_per_page: 25,
            ..Default::default()
        };

        let output = JsonRenderer.render(&context).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output.body).unwrap();
        assert_eq!(
            parsed,
            json!({
                "page": 2,
                "pages": 2,
                "total": 30,
                "records": 1,
                "columns": [{"id": "vol", "label": "Volume", "sortable": true, "filterable": true}],
                "rows": [{"idConcated": "3", "vol": 85}],
            })
        );
    }
}
