//! Record store wrapper that injects failures and counts calls

use std::cell::Cell;
use std::collections::{HashMap, HashSet};

use crate::core::store::{CourseRecord, RecordStore, SqliteStore, StoreError};

pub(crate) struct FlakyStore {
    pub(crate) inner: SqliteStore,
    failing_categories: HashSet<String>,
    failing_courses: HashSet<String>,
    category_attempts: HashMap<String, usize>,
    category_lookups: Cell<usize>,
    pub(crate) course_creates: usize,
    pub(crate) sortorder_fixes: usize,
}

impl FlakyStore {
    pub(crate) fn new() -> Self {
        Self {
            inner: SqliteStore::open_in_memory().unwrap(),
            failing_categories: HashSet::new(),
            failing_courses: HashSet::new(),
            category_attempts: HashMap::new(),
            category_lookups: Cell::new(0),
            course_creates: 0,
            sortorder_fixes: 0,
        }
    }

    pub(crate) fn fail_category(mut self, name: &str) -> Self {
        self.failing_categories.insert(name.to_string());
        self
    }

    pub(crate) fn fail_course(mut self, shortname: &str) -> Self {
        self.failing_courses.insert(shortname.to_string());
        self
    }

    pub(crate) fn category_attempts(&self, name: &str) -> usize {
        self.category_attempts.get(name).copied().unwrap_or(0)
    }

    pub(crate) fn category_lookups(&self) -> usize {
        self.category_lookups.get()
    }
}

impl RecordStore for FlakyStore {
    fn category_exists(&self, id: i64) -> Result<bool, StoreError> {
        self.inner.category_exists(id)
    }

    fn find_category(&self, name: &str, parent: i64) -> Result<Option<i64>, StoreError> {
        self.category_lookups.set(self.category_lookups.get() + 1);
        self.inner.find_category(name, parent)
    }

    fn create_category(&mut self, name: &str, parent: i64) -> Result<i64, StoreError> {
        *self.category_attempts.entry(name.to_string()).or_default() += 1;
        if self.failing_categories.contains(name) {
            return Err(StoreError::Invalid(format!("injected failure for {}", name)));
        }
        self.inner.create_category(name, parent)
    }

    fn course_shortname_exists(&self, shortname: &str) -> Result<bool, StoreError> {
        self.inner.course_shortname_exists(shortname)
    }

    fn create_course(&mut self, course: &CourseRecord) -> Result<i64, StoreError> {
        self.course_creates += 1;
        if self.failing_courses.contains(&course.shortname()) {
            return Err(StoreError::Invalid(format!(
                "injected failure for {}",
                course.shortname()
            )));
        }
        self.inner.create_course(course)
    }

    fn fix_course_sortorder(&mut self) -> Result<(), StoreError> {
        self.sortorder_fixes += 1;
        self.inner.fix_course_sortorder()
    }
}
