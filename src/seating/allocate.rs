use std::collections::HashMap;

use tracing::debug;

use crate::config::GroupExpectation;
use crate::error::{AllocationError, Leftover, Result};
use super::types::{AttendeeRecord, GroupCount, PlanSegment, TableAssignment};

/// Members of one source group in sheet order, plus how many have been seated
struct GroupQueue<'a> {
    members: Vec<&'a AttendeeRecord>,
    cursor: usize,
}

impl<'a> GroupQueue<'a> {
    fn remaining(&self) -> &[&'a AttendeeRecord] {
        &self.members[self.cursor..]
    }

    /// Takes the next `seats` members, or `None` if fewer remain
    fn draw(&mut self, seats: usize) -> Option<&[&'a AttendeeRecord]> {
        if self.remaining().len() < seats {
            return None;
        }
        let start = self.cursor;
        self.cursor += seats;
        Some(&self.members[start..self.cursor])
    }
}

/// Source groups keyed by name, remembering the order groups first appear in
struct GroupBuckets<'a> {
    order: Vec<String>,
    queues: HashMap<String, GroupQueue<'a>>,
}

impl<'a> GroupBuckets<'a> {
    fn new(attendees: &'a [AttendeeRecord]) -> Self {
        let mut order = Vec::new();
        let mut queues: HashMap<String, GroupQueue<'a>> = HashMap::new();

        for attendee in attendees {
            queues
                .entry(attendee.group.clone())
                .or_insert_with(|| {
                    order.push(attendee.group.clone());
                    GroupQueue {
                        members: Vec::new(),
                        cursor: 0,
                    }
                })
                .members
                .push(attendee);
        }

        Self { order, queues }
    }

    fn size(&self, group: &str) -> usize {
        self.queues.get(group).map(|q| q.members.len()).unwrap_or(0)
    }

    fn leftovers(&self) -> Vec<Leftover> {
        self.order
            .iter()
            .filter_map(|group| {
                let remaining = self.queues.get(group)?.remaining();
                if remaining.is_empty() {
                    return None;
                }
                Some(Leftover {
                    group: group.clone(),
                    names: remaining.iter().map(|a| a.display_name()).collect(),
                })
            })
            .collect()
    }
}

/// Attendee counts per source group, in order of first appearance
pub fn count_groups(attendees: &[AttendeeRecord]) -> Vec<GroupCount> {
    let buckets = GroupBuckets::new(attendees);
    buckets
        .order
        .iter()
        .map(|group| GroupCount {
            group: group.clone(),
            count: buckets.size(group),
        })
        .collect()
}

/// Checks every configured group has exactly its expected number of attendees
pub fn check_group_sizes(attendees: &[AttendeeRecord], expected: &[GroupExpectation]) -> Result<()> {
    let buckets = GroupBuckets::new(attendees);

    for expectation in expected {
        let actual = buckets.size(&expectation.group);
        if actual != expectation.expected {
            return Err(AllocationError::GroupCountMismatch {
                group: expectation.group.clone(),
                expected: expectation.expected,
                actual,
            });
        }
    }

    Ok(())
}

/// Seats attendees table by table following the plan
///
/// Each segment draws the earliest unseated members of its group. The plan has to
/// consume every group exactly: a short group and any leftover attendee are both errors.
pub fn allocate_tables(attendees: &[AttendeeRecord], plan: &[PlanSegment]) -> Result<Vec<TableAssignment>> {
    let mut buckets = GroupBuckets::new(attendees);
    let mut assignments = Vec::with_capacity(attendees.len());

    for segment in plan {
        let queue = buckets.queues.get_mut(&segment.group);
        let available = queue.as_ref().map(|q| q.remaining().len()).unwrap_or(0);

        let drawn = queue
            .and_then(|q| q.draw(segment.seats))
            .ok_or_else(|| AllocationError::InsufficientAttendees {
                group: segment.group.clone(),
                table: segment.table.clone(),
                needed: segment.seats,
                available,
            })?;

        debug!(
            "{} <- {} from group \"{}\" ({} left)",
            segment.table,
            drawn.len(),
            segment.group,
            available - drawn.len()
        );

        assignments.extend(drawn.iter().map(|a| TableAssignment::seat(a, &segment.table)));
    }

    let leftovers = buckets.leftovers();
    if !leftovers.is_empty() {
        return Err(AllocationError::UnassignedAttendees { leftovers });
    }

    Ok(assignments)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group_of(group: &str, count: usize, first_line: u64) -> Vec<AttendeeRecord> {
        (0..count)
            .map(|i| AttendeeRecord::new(first_line + i as u64, &format!("{}{}", group, i), "Guest", group))
            .collect()
    }

    fn expect(group: &str, expected: usize) -> GroupExpectation {
        GroupExpectation {
            group: group.to_string(),
            expected,
        }
    }

    #[test]
    fn draws_in_sheet_order_within_group() {
        let mut attendees = group_of("Kara", 3, 2);
        attendees.insert(1, AttendeeRecord::new(50, "Tom", "Hart", "Work"));
        let plan = vec![
            PlanSegment::new("Table 1", "Kara", 2),
            PlanSegment::new("Table 2", "Work", 1),
            PlanSegment::new("Table 2", "Kara", 1),
        ];

        let assignments = allocate_tables(&attendees, &plan).unwrap();

        let seated: Vec<(&str, &str)> = assignments
            .iter()
            .map(|a| (a.table_label.as_str(), a.first_name.as_str()))
            .collect();
        assert_eq!(
            seated,
            vec![("Table 1", "Kara0"), ("Table 1", "Kara1"), ("Table 2", "Tom"), ("Table 2", "Kara2")]
        );
        assert_eq!(assignments[3].line_number, 4);
    }

    #[test]
    fn group_size_mismatch_names_group_and_counts() {
        let attendees = group_of("Work", 13, 2);

        let err = check_group_sizes(&attendees, &[expect("Work", 14)]).unwrap_err();

        assert_eq!(err.to_string(), "Group \"Work\" expected 14 attendees, got 13");
    }

    #[test]
    fn configured_group_missing_from_sheet_counts_as_zero() {
        let attendees = group_of("Work", 2, 2);

        match check_group_sizes(&attendees, &[expect("Work", 2), expect("", 2)]) {
            Err(AllocationError::GroupCountMismatch { group, actual, .. }) => {
                assert_eq!(group, "");
                assert_eq!(actual, 0);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn short_group_fails_segment() {
        let attendees = group_of("Kara", 17, 2);
        let plan = vec![PlanSegment::new("Table 1", "Kara", 18)];

        let err = allocate_tables(&attendees, &plan).unwrap_err();

        assert_eq!(err.to_string(), "Group \"Kara\" cannot fill Table 1: need 18, have 17");
    }

    #[test]
    fn later_segment_sees_only_remainder() {
        let attendees = group_of("Kara", 17, 2);
        let plan = vec![
            PlanSegment::new("Table 1", "Kara", 10),
            PlanSegment::new("Table 2", "Kara", 8),
        ];

        match allocate_tables(&attendees, &plan) {
            Err(AllocationError::InsufficientAttendees { table, needed, available, .. }) => {
                assert_eq!(table, "Table 2");
                assert_eq!((needed, available), (8, 7));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn unplanned_group_is_left_over() {
        let mut attendees = group_of("Kara", 2, 2);
        attendees.extend(group_of("Work", 3, 10));
        let plan = vec![
            PlanSegment::new("Table 1", "Kara", 2),
            PlanSegment::new("Table 2", "Work", 1),
        ];

        match allocate_tables(&attendees, &plan) {
            Err(AllocationError::UnassignedAttendees { leftovers }) => {
                assert_eq!(
                    leftovers,
                    vec![Leftover {
                        group: "Work".into(),
                        names: vec!["Work1 Guest".into(), "Work2 Guest".into()],
                    }]
                );
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn every_attendee_is_seated_exactly_once() {
        let mut attendees = group_of("Kara", 18, 2);
        attendees.extend(group_of("Work", 14, 30));
        attendees.extend(group_of("", 2, 60));
        let plan = vec![
            PlanSegment::new("Sweetheart Table", "", 2),
            PlanSegment::new("Table 1", "Kara", 10),
            PlanSegment::new("Table 2", "Kara", 8),
            PlanSegment::new("Table 2", "Work", 2),
            PlanSegment::new("Table 3", "Work", 12),
        ];

        let assignments = allocate_tables(&attendees, &plan).unwrap();

        let mut seated: Vec<u64> = assignments.iter().map(|a| a.line_number).collect();
        let mut input: Vec<u64> = attendees.iter().map(|a| a.line_number).collect();
        seated.sort();
        input.sort();
        assert_eq!(seated, input);
    }

    #[test]
    fn counts_groups_in_first_seen_order() {
        let mut attendees = group_of("Work", 2, 2);
        attendees.extend(group_of("Kara", 1, 10));
        attendees.extend(group_of("Work", 1, 20));

        let counts: Vec<(String, usize)> = count_groups(&attendees)
            .into_iter()
            .map(|c| (c.group, c.count))
            .collect();

        assert_eq!(counts, vec![("Work".to_string(), 3), ("Kara".to_string(), 1)]);
    }
}
