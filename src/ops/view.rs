use crate::model::filter::{FilterState, Stats};
use crate::model::task::Task;

/// Tasks matching `filter`, in collection order.
///
/// Search is a case-insensitive substring match against title or description;
/// status and priority filters must both match as well.
pub fn compute_filtered_view<'a, I>(tasks: I, filter: &FilterState) -> Vec<&'a Task>
where
    I: IntoIterator<Item = &'a Task>,
{
    let needle = filter.search.to_lowercase();
    tasks
        .into_iter()
        .filter(|task| matches_search(task, &needle))
        .filter(|task| filter.status.matches(task))
        .filter(|task| filter.priority.matches(task))
        .collect()
}

/// `needle` must already be lowercased
fn matches_search(task: &Task, needle: &str) -> bool {
    needle.is_empty()
        || task.title.to_lowercase().contains(needle)
        || task.description_text().to_lowercase().contains(needle)
}

/// Aggregate counts over all tasks
pub fn compute_stats<'a, I>(tasks: I) -> Stats
where
    I: IntoIterator<Item = &'a Task>,
{
    let (total, completed) = tasks
        .into_iter()
        .fold((0usize, 0usize), |(total, done), task| {
            (total + 1, done + usize::from(task.completed))
        });
    Stats {
        total,
        pending: total - completed,
        completed,
        completion_rate: completion_rate(completed, total),
    }
}

/// round(completed / total × 100), half-up, in integer arithmetic
fn completion_rate(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let rate = (completed * 200 + total) / (total * 2);
    u8::try_from(rate.min(100)).unwrap_or(100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::filter::{PriorityFilter, StatusFilter};
    use crate::model::task::Priority;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn task(id: i64, title: &str, completed: bool, priority: Priority) -> Task {
        let now = Utc.with_ymd_and_hms(2025, 12, 13, 10, 0, 0).unwrap();
        Task {
            completed,
            priority,
            ..Task::new(id, "u", title, now)
        }
    }

    fn sample() -> Vec<Task> {
        let mut docs = task(3, "Update documentation", true, Priority::Low);
        docs.description = Some("Update API docs".into());
        let mut review = task(2, "Review pull requests", false, Priority::Medium);
        review.description = Some("Review pending PRs".into());
        vec![
            task(1, "Complete project proposal", false, Priority::High),
            review,
            docs,
        ]
    }

    fn ids(view: &[&Task]) -> Vec<i64> {
        view.iter().map(|t| t.id).collect()
    }

    #[test]
    fn test_default_filter_keeps_everything_in_order() {
        let tasks = sample();
        let view = compute_filtered_view(&tasks, &FilterState::default());
        assert_eq!(ids(&view), vec![1, 2, 3]);
    }

    #[test]
    fn test_search_matches_title_or_description_case_insensitive() {
        let tasks = sample();
        let filter = FilterState {
            search: "API".into(),
            ..Default::default()
        };
        assert_eq!(ids(&compute_filtered_view(&tasks, &filter)), vec![3]);

        let filter = FilterState {
            search: "review".into(),
            ..Default::default()
        };
        assert_eq!(ids(&compute_filtered_view(&tasks, &filter)), vec![2]);
    }

    #[test]
    fn test_status_and_priority_combine() {
        let tasks = sample();
        let filter = FilterState {
            status: StatusFilter::Pending,
            ..Default::default()
        };
        assert_eq!(ids(&compute_filtered_view(&tasks, &filter)), vec![1, 2]);

        let filter = FilterState {
            status: StatusFilter::Pending,
            priority: PriorityFilter::Only(Priority::High),
            ..Default::default()
        };
        assert_eq!(ids(&compute_filtered_view(&tasks, &filter)), vec![1]);

        let filter = FilterState {
            status: StatusFilter::Completed,
            priority: PriorityFilter::Only(Priority::High),
            ..Default::default()
        };
        assert!(compute_filtered_view(&tasks, &filter).is_empty());
    }

    #[test]
    fn test_filtered_view_is_repeatable() {
        let tasks = sample();
        let filter = FilterState {
            search: "e".into(),
            status: StatusFilter::All,
            priority: PriorityFilter::All,
        };
        let first = ids(&compute_filtered_view(&tasks, &filter));
        let second = ids(&compute_filtered_view(&tasks, &filter));
        assert_eq!(first, second);
    }

    #[test]
    fn test_stats_two_tasks() {
        let tasks = vec![
            task(1, "A", false, Priority::High),
            task(2, "B", true, Priority::Low),
        ];
        assert_eq!(
            compute_stats(&tasks),
            Stats {
                total: 2,
                pending: 1,
                completed: 1,
                completion_rate: 50,
            }
        );
    }

    #[test]
    fn test_stats_empty_is_zero() {
        let stats = compute_stats(&Vec::<Task>::new());
        assert_eq!(stats, Stats::default());
    }

    #[test]
    fn test_completion_rate_rounding() {
        assert_eq!(completion_rate(1, 3), 33);
        assert_eq!(completion_rate(2, 3), 67);
        assert_eq!(completion_rate(1, 8), 13);
        assert_eq!(completion_rate(5, 5), 100);
        assert_eq!(completion_rate(0, 5), 0);
    }

    #[test]
    fn test_stats_invariants_hold() {
        for n in 0..20usize {
            let tasks: Vec<Task> = (0..n)
                .map(|i| task(i as i64, "t", i % 3 == 0, Priority::Medium))
                .collect();
            let stats = compute_stats(&tasks);
            assert_eq!(stats.pending + stats.completed, stats.total);
            assert!(stats.completion_rate <= 100);
        }
    }
}
