use crate::models::{Snippet, SnippetDraft};
use chrono::{DateTime, Utc};

/// Example snippets written to a brand new store.
pub fn sample_snippets(now: DateTime<Utc>) -> Vec<Snippet> {
    vec![
        SnippetDraft::new(
            "Active Users",
            "SELECT Id, Name, Email, CreatedAt\nFROM Users\nWHERE Active = 1\nORDER BY CreatedAt DESC",
            "DBA",
        )
        .with_description("Lists every active user in the system"),
        SnippetDraft::new(
            "Top 10 Best Selling Products",
            "SELECT TOP 10\n    p.Name,\n    COUNT(*) AS TotalSales,\n    SUM(s.Amount) AS TotalAmount\nFROM Products p\nINNER JOIN Sales s ON p.Id = s.ProductId\nWHERE s.SaleDate >= DATEADD(MONTH, -1, GETDATE())\nGROUP BY p.Name\nORDER BY TotalSales DESC",
            "Reports",
        )
        .with_description("Products with the highest sales volume this month"),
        SnippetDraft::new(
            "Check Database Locks",
            "SELECT\n    request_session_id AS SPID,\n    DB_NAME(resource_database_id) AS DatabaseName,\n    resource_type,\n    request_mode,\n    request_status\nFROM sys.dm_tran_locks\nWHERE resource_type <> 'DATABASE'",
            "Dev",
        )
        .with_description("Finds sessions holding active locks"),
        SnippetDraft::new(
            "Purge Temp Table",
            "DELETE FROM TempTable\nWHERE CreatedAt < DATEADD(DAY, -7, GETDATE())",
            "Dev",
        )
        .with_description("Removes week-old rows from the temp table"),
    ]
    .into_iter()
    .map(|draft| draft.into_snippet(now))
    .collect()
}
