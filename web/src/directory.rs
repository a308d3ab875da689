//! Static employee directory consulted by the scan endpoint.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Employee {
    pub id: &'static str,
    pub name: &'static str,
    pub position: &'static str,
    pub department: &'static str,
}

const EMPLOYEES: &[Employee] = &[
    Employee {
        id: "123",
        name: "John Smith",
        position: "Software Engineer",
        department: "Engineering",
    },
    Employee {
        id: "535",
        name: "Sarah Johnson",
        position: "Project Manager",
        department: "Management",
    },
    Employee {
        id: "121",
        name: "Mike Davis",
        position: "Systems Analyst",
        department: "IT",
    },
    Employee {
        id: "553",
        name: "Lisa Chen",
        position: "UX Designer",
        department: "Design",
    },
    Employee {
        id: "802",
        name: "Alex Morgan",
        position: "DevOps Engineer",
        department: "Operations",
    },
];

pub fn find(id: &str) -> Option<&'static Employee> {
    EMPLOYEES.iter().find(|employee| employee.id == id)
}

/// Looks up every comma separated ID in `ids`, ignoring surrounding whitespace.
///
/// Unknown IDs are skipped; an ID listed twice is returned twice.
pub fn find_all(ids: &str) -> Vec<&'static Employee> {
    ids.split(',').filter_map(|id| find(id.trim())).collect()
}
