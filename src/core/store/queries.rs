//! Read queries and sort-order maintenance

use std::collections::HashMap;
use std::fs;

use rusqlite::params;

use super::{CategoryInfo, CourseInfo, SqliteStore, StoreError, StoreStats};

/// Sort-order slots in one block; a category takes as many blocks as it needs
const COURSES_PER_CATEGORY: i64 = 10_000;

impl SqliteStore {
    /// Renumber course sortorder in per-category blocks and refresh course counts
    ///
    /// Categories are visited in sortorder, each starting on a fresh block, so
    /// course sortorder follows category order however large a category is.
    pub(super) fn renumber_courses(&mut self) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        {
            let categories: Vec<(i64, i64)> = {
                let mut stmt =
                    tx.prepare("SELECT id, sortorder FROM course_categories ORDER BY sortorder, id")?;
                let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
                rows.collect::<Result<_, _>>()?
            };

            let mut select = tx.prepare(
                "SELECT id FROM course WHERE category = ?1 ORDER BY sortorder, id",
            )?;
            let mut update = tx.prepare("UPDATE course SET sortorder = ?1 WHERE id = ?2")?;
            let mut count = tx.prepare("UPDATE course_categories SET coursecount = ?1 WHERE id = ?2")?;

            let mut block = 1;
            for (category_id, _) in categories {
                let course_ids: Vec<i64> = select
                    .query_map(params![category_id], |row| row.get(0))?
                    .collect::<Result<_, _>>()?;

                let base = block * COURSES_PER_CATEGORY;
                let used = course_ids.len() as i64;
                block += ((used + COURSES_PER_CATEGORY - 1) / COURSES_PER_CATEGORY).max(1);
                for (position, course_id) in course_ids.iter().enumerate() {
                    update.execute(params![base + position as i64 + 1, course_id])?;
                }
                count.execute(params![used, category_id])?;
            }
        }
        tx.commit()?;

        tracing::debug!("course sort order renumbered");
        Ok(())
    }

    /// List all categories with display paths, in tree order
    pub fn list_categories(&self) -> Result<Vec<CategoryInfo>, StoreError> {
        let mut stmt = self.conn.prepare(
            r#"SELECT id, name, parent, sortorder, depth, path, coursecount
               FROM course_categories"#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(CategoryInfo {
                id: row.get(0)?,
                name: row.get(1)?,
                parent: row.get(2)?,
                sortorder: row.get(3)?,
                depth: row.get(4)?,
                path: row.get(5)?,
                display_path: String::new(),
                coursecount: row.get(6)?,
            })
        })?;
        let mut categories: Vec<CategoryInfo> = rows.collect::<Result<_, _>>()?;

        let names: HashMap<i64, String> = categories
            .iter()
            .map(|c| (c.id, c.name.clone()))
            .collect();
        let orders: HashMap<i64, i64> = categories.iter().map(|c| (c.id, c.sortorder)).collect();

        let mut keys: HashMap<i64, Vec<(i64, i64)>> = HashMap::new();
        for category in &mut categories {
            let ids: Vec<i64> = category
                .path
                .split('/')
                .filter_map(|part| part.parse().ok())
                .collect();
            category.display_path = ids
                .iter()
                .map(|id| names.get(id).map(String::as_str).unwrap_or("?"))
                .collect::<Vec<_>>()
                .join(" / ");
            keys.insert(
                category.id,
                ids.iter()
                    .map(|id| (orders.get(id).copied().unwrap_or(0), *id))
                    .collect(),
            );
        }

        categories.sort_by(|a, b| keys[&a.id].cmp(&keys[&b.id]));
        Ok(categories)
    }

    /// List courses, optionally limited to one category
    pub fn list_courses(&self, category: Option<i64>) -> Result<Vec<CourseInfo>, StoreError> {
        let mut stmt = self.conn.prepare(
            r#"SELECT id, category, sortorder, shortname, fullname, idnumber, startdate, visible
               FROM course
               WHERE ?1 IS NULL OR category = ?1
               ORDER BY sortorder, id"#,
        )?;
        let rows = stmt.query_map(params![category], |row| {
            Ok(CourseInfo {
                id: row.get(0)?,
                category: row.get(1)?,
                sortorder: row.get(2)?,
                shortname: row.get(3)?,
                fullname: row.get(4)?,
                idnumber: row.get(5)?,
                startdate: row.get(6)?,
                visible: row.get::<_, i64>(7)? != 0,
            })
        })?;

        Ok(rows.collect::<Result<_, _>>()?)
    }

    /// Get store statistics
    pub fn statistics(&self) -> Result<StoreStats, StoreError> {
        let categories: usize =
            self.conn
                .query_row("SELECT COUNT(*) FROM course_categories", [], |row| row.get(0))?;
        let courses: usize = self
            .conn
            .query_row("SELECT COUNT(*) FROM course", [], |row| row.get(0))?;
        let db_size_bytes = self
            .path
            .as_ref()
            .and_then(|p| fs::metadata(p).ok())
            .map(|m| m.len())
            .unwrap_or(0);

        Ok(StoreStats {
            categories,
            courses,
            db_size_bytes,
        })
    }
}
