// ==========================================
// 仓储装载跟踪系统 - 任务查询引擎
// ==========================================
// 职责: 任务集合的纯函数过滤与排序
// 红线1: 不修改输入,同输入必得同输出(稳定排序)
// 红线2: 日期类排序键缺失值恒排在最后,与排序方向无关
// ==========================================

use crate::domain::task::{Task, TaskQuery};
use crate::domain::types::{ArchivedFilter, SortDirection, TaskSortKey};
use std::cmp::Ordering;
use tracing::instrument;

// ==========================================
// TaskQueryEngine - 任务查询引擎
// ==========================================
pub struct TaskQueryEngine;

impl TaskQueryEngine {
    pub fn new() -> Self {
        Self
    }

    /// 过滤 + 排序
    ///
    /// 过滤条件全部为与关系:
    /// 1. 归档三态
    /// 2. 全文搜索: 标题/描述/任一标签的子串,忽略大小写
    /// 3. 状态/优先级精确匹配
    /// 4. 截止日期同日匹配(无截止日期的任务不命中)
    /// 5. 负责人子串匹配,忽略大小写
    /// 6. 标签词: 逗号分隔,任一词是任一标签的子串即命中
    #[instrument(skip(self, tasks, query), fields(total = tasks.len()))]
    pub fn filter_and_sort<'a>(&self, tasks: &'a [Task], query: &TaskQuery) -> Vec<&'a Task> {
        let mut filtered: Vec<&Task> = tasks.iter().filter(|t| Self::matches(t, query)).collect();
        filtered.sort_by(|a, b| Self::compare(a, b, query.sort_key, query.direction));
        filtered
    }

    fn matches(task: &Task, query: &TaskQuery) -> bool {
        match query.archived {
            ArchivedFilter::No => {
                if task.is_archived {
                    return false;
                }
            }
            ArchivedFilter::Yes => {
                if !task.is_archived {
                    return false;
                }
            }
            ArchivedFilter::All => {}
        }

        let search = query.search.to_lowercase();
        if !search.is_empty() {
            let hit = task.title.to_lowercase().contains(&search)
                || task.description.to_lowercase().contains(&search)
                || task.tags.iter().any(|tag| tag.to_lowercase().contains(&search));
            if !hit {
                return false;
            }
        }

        if let Some(status) = query.status {
            if task.status != status {
                return false;
            }
        }
        if let Some(priority) = query.priority {
            if task.priority != priority {
                return false;
            }
        }
        if let Some(due) = query.due_date {
            if task.due_date != Some(due) {
                return false;
            }
        }

        let assignee = query.assigned_to.to_lowercase();
        if !assignee.is_empty() && !task.assigned_to.to_lowercase().contains(&assignee) {
            return false;
        }

        let terms: Vec<String> = query
            .tags
            .split(',')
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        if !terms.is_empty() {
            let hit = task.tags.iter().any(|tag| {
                let tag = tag.to_lowercase();
                terms.iter().any(|term| tag.contains(term.as_str()))
            });
            if !hit {
                return false;
            }
        }

        true
    }

    fn compare(a: &Task, b: &Task, key: TaskSortKey, direction: SortDirection) -> Ordering {
        let primary = match key {
            TaskSortKey::Title => {
                Self::directed(a.title.to_lowercase().cmp(&b.title.to_lowercase()), direction)
            }
            TaskSortKey::Status => {
                Self::directed(a.status.to_string().cmp(&b.status.to_string()), direction)
            }
            TaskSortKey::Priority => Self::directed(a.priority.cmp(&b.priority), direction),
            TaskSortKey::DueDate => Self::compare_optional(a.due_date, b.due_date, direction),
            TaskSortKey::CreatedAt => {
                Self::compare_optional(Some(a.created_at), Some(b.created_at), direction)
            }
            TaskSortKey::UpdatedAt => {
                Self::compare_optional(Some(a.updated_at), Some(b.updated_at), direction)
            }
            TaskSortKey::CompletedAt => {
                Self::compare_optional(a.completed_at, b.completed_at, direction)
            }
        };
        // 并列统一按创建时间倒序
        primary.then_with(|| b.created_at.cmp(&a.created_at))
    }

    fn directed(ordering: Ordering, direction: SortDirection) -> Ordering {
        match direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }

    /// 缺失值恒排最后,仅两侧都有值时应用排序方向
    fn compare_optional<T: Ord>(a: Option<T>, b: Option<T>, direction: SortDirection) -> Ordering {
        match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(a), Some(b)) => Self::directed(a.cmp(&b), direction),
        }
    }
}

impl Default for TaskQueryEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{TaskPriority, TaskStatus};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn at(day: u32, hour: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, day, hour, 0, 0).unwrap()
    }

    fn task(title: &str, day: u32) -> Task {
        Task::new(title, at(day, 8))
    }

    #[test]
    fn test_archived_tri_state() {
        let engine = TaskQueryEngine::new();
        let mut archived = task("旧任务", 1);
        archived.is_archived = true;
        let active = task("新任务", 2);
        let tasks = vec![archived, active];

        let mut query = TaskQuery::default();
        assert_eq!(engine.filter_and_sort(&tasks, &query).len(), 1, "默认仅未归档");

        query.archived = ArchivedFilter::Yes;
        let result = engine.filter_and_sort(&tasks, &query);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].title, "旧任务");

        query.archived = ArchivedFilter::All;
        assert_eq!(engine.filter_and_sort(&tasks, &query).len(), 2);
    }

    #[test]
    fn test_search_covers_title_description_tags() {
        let engine = TaskQueryEngine::new();
        let mut by_title = task("Count Dock B", 1);
        by_title.tags = vec!["inventory".to_string()];
        let mut by_desc = task("其他", 2);
        by_desc.description = "check dock assignments".to_string();
        let mut by_tag = task("批次盘点", 3);
        by_tag.tags = vec!["Dock-Crew".to_string()];
        let miss = task("无关", 4);
        let tasks = vec![by_title, by_desc, by_tag, miss];

        let query = TaskQuery {
            search: "DOCK".to_string(),
            ..TaskQuery::default()
        };
        let result = engine.filter_and_sort(&tasks, &query);
        assert_eq!(result.len(), 3, "搜索应覆盖标题/描述/标签且忽略大小写");
    }

    #[test]
    fn test_exact_and_substring_filters() {
        let engine = TaskQueryEngine::new();
        let mut a = task("A", 1);
        a.status = TaskStatus::InProgress;
        a.priority = TaskPriority::High;
        a.assigned_to = "Zhang Wei".to_string();
        a.due_date = Some(NaiveDate::from_ymd_opt(2026, 1, 20).unwrap());
        let mut b = task("B", 2);
        b.status = TaskStatus::InProgress;
        b.assigned_to = "Li Lei".to_string();
        let tasks = vec![a, b];

        let query = TaskQuery {
            status: Some(TaskStatus::InProgress),
            priority: Some(TaskPriority::High),
            ..TaskQuery::default()
        };
        let result = engine.filter_and_sort(&tasks, &query);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].title, "A");

        let query = TaskQuery {
            assigned_to: "zhang".to_string(),
            ..TaskQuery::default()
        };
        assert_eq!(engine.filter_and_sort(&tasks, &query).len(), 1);

        // 截止日期同日匹配,无截止日期的任务不命中
        let query = TaskQuery {
            due_date: Some(NaiveDate::from_ymd_opt(2026, 1, 20).unwrap()),
            ..TaskQuery::default()
        };
        let result = engine.filter_and_sort(&tasks, &query);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].title, "A");
    }

    #[test]
    fn test_tag_terms_any_substring() {
        let engine = TaskQueryEngine::new();
        let mut a = task("A", 1);
        a.tags = vec!["forklift".to_string(), "safety".to_string()];
        let mut b = task("B", 2);
        b.tags = vec!["audit".to_string()];
        let c = task("C", 3);
        let tasks = vec![a, b, c];

        let query = TaskQuery {
            tags: " lift , night ".to_string(),
            ..TaskQuery::default()
        };
        let result = engine.filter_and_sort(&tasks, &query);
        assert_eq!(result.len(), 1, "任一词命中任一标签即保留");
        assert_eq!(result[0].title, "A");
    }

    #[test]
    fn test_priority_rank_sort() {
        let engine = TaskQueryEngine::new();
        let mut low = task("低", 1);
        low.priority = TaskPriority::Low;
        let mut urgent = task("急", 2);
        urgent.priority = TaskPriority::Urgent;
        let mut medium = task("中", 3);
        medium.priority = TaskPriority::Medium;
        let tasks = vec![low, urgent, medium];

        let query = TaskQuery {
            sort_key: TaskSortKey::Priority,
            direction: SortDirection::Asc,
            ..TaskQuery::default()
        };
        let titles: Vec<&str> = engine
            .filter_and_sort(&tasks, &query)
            .iter()
            .map(|t| t.title.as_str())
            .collect();
        assert_eq!(titles, vec!["低", "中", "急"]);
    }

    #[test]
    fn test_status_sort_is_alphabetical() {
        let engine = TaskQueryEngine::new();
        let mut todo = task("T", 1);
        todo.status = TaskStatus::Todo;
        let mut completed = task("C", 2);
        completed.status = TaskStatus::Completed;
        let mut on_hold = task("O", 3);
        on_hold.status = TaskStatus::OnHold;
        let mut in_progress = task("I", 4);
        in_progress.status = TaskStatus::InProgress;
        let tasks = vec![todo, completed, on_hold, in_progress];

        let query = TaskQuery {
            sort_key: TaskSortKey::Status,
            direction: SortDirection::Asc,
            archived: ArchivedFilter::All,
            ..TaskQuery::default()
        };
        let titles: Vec<&str> = engine
            .filter_and_sort(&tasks, &query)
            .iter()
            .map(|t| t.title.as_str())
            .collect();
        assert_eq!(titles, vec!["C", "I", "O", "T"]);
    }

    #[test]
    fn test_absent_due_date_always_last() {
        let engine = TaskQueryEngine::new();
        let mut early = task("早", 1);
        early.due_date = Some(NaiveDate::from_ymd_opt(2026, 1, 20).unwrap());
        let mut late = task("晚", 2);
        late.due_date = Some(NaiveDate::from_ymd_opt(2026, 1, 25).unwrap());
        let undated = task("无", 3);
        let tasks = vec![undated, late, early];

        let mut query = TaskQuery {
            sort_key: TaskSortKey::DueDate,
            direction: SortDirection::Asc,
            ..TaskQuery::default()
        };
        let titles: Vec<&str> = engine
            .filter_and_sort(&tasks, &query)
            .iter()
            .map(|t| t.title.as_str())
            .collect();
        assert_eq!(titles, vec!["早", "晚", "无"]);

        // 降序时缺失值仍在最后
        query.direction = SortDirection::Desc;
        let titles: Vec<&str> = engine
            .filter_and_sort(&tasks, &query)
            .iter()
            .map(|t| t.title.as_str())
            .collect();
        assert_eq!(titles, vec!["晚", "早", "无"], "缺失截止日期恒排最后");
    }

    #[test]
    fn test_tie_breaks_by_created_desc() {
        let engine = TaskQueryEngine::new();
        let mut older = task("旧", 1);
        older.priority = TaskPriority::High;
        let mut newer = task("新", 5);
        newer.priority = TaskPriority::High;
        let tasks = vec![older, newer];

        let query = TaskQuery {
            sort_key: TaskSortKey::Priority,
            direction: SortDirection::Asc,
            ..TaskQuery::default()
        };
        let titles: Vec<&str> = engine
            .filter_and_sort(&tasks, &query)
            .iter()
            .map(|t| t.title.as_str())
            .collect();
        assert_eq!(titles, vec!["新", "旧"], "并列按创建时间倒序");
    }

    #[test]
    fn test_deterministic_repeat() {
        let engine = TaskQueryEngine::new();
        let tasks: Vec<Task> = (1..=9).map(|d| task(&format!("T{}", d), d)).collect();
        let query = TaskQuery {
            sort_key: TaskSortKey::Title,
            direction: SortDirection::Asc,
            ..TaskQuery::default()
        };

        let first: Vec<String> = engine
            .filter_and_sort(&tasks, &query)
            .iter()
            .map(|t| t.id.clone())
            .collect();
        let second: Vec<String> = engine
            .filter_and_sort(&tasks, &query)
            .iter()
            .map(|t| t.id.clone())
            .collect();
        assert_eq!(first, second, "同输入必得同输出");

        // 对已排序输出再过滤排序: 结果不变
        let owned: Vec<Task> = engine
            .filter_and_sort(&tasks, &query)
            .into_iter()
            .cloned()
            .collect();
        let reapplied: Vec<String> = engine
            .filter_and_sort(&owned, &query)
            .iter()
            .map(|t| t.id.clone())
            .collect();
        assert_eq!(reapplied, first, "重复应用不改变结果");
    }
}
