use servicedesk_core::config::LoadOptions;
use servicedesk_db::{connect_with_config, migrations, SampleDataset, SeedResult};

use crate::commands::{
    build_runtime, load_config, CommandResult, Failure, EXIT_DATABASE, EXIT_MIGRATION,
};

pub fn run(options: LoadOptions) -> CommandResult {
    let config = match load_config("seed", options) {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match build_runtime("seed") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = connect_with_config(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), EXIT_DATABASE))?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), EXIT_MIGRATION))?;

        let seeded = SampleDataset::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), EXIT_MIGRATION))?;
        let verification = SampleDataset::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), EXIT_MIGRATION))?;

        pool.close().await;

        if verification.all_present {
            Ok::<SeedResult, Failure>(seeded)
        } else {
            Err(("seed_verification", verification_message(&verification.missing()), EXIT_MIGRATION))
        }
    });

    match result {
        Ok(seeded) => CommandResult::success("seed", summary(seeded)),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

fn summary(seeded: SeedResult) -> String {
    format!(
        "sample dataset present: {} customers and {} orders ({} new customers, {} new orders)",
        SampleDataset::customers().len(),
        SampleDataset::orders().len(),
        seeded.customers_inserted,
        seeded.orders_inserted
    )
}

fn verification_message(missing: &[&str]) -> String {
    if missing.is_empty() {
        "Some sample data failed to load".to_string()
    } else {
        format!("Seed verification failed for: {}", missing.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use servicedesk_db::SeedResult;

    use super::{summary, verification_message};

    #[test]
    fn verification_message_names_missing_rows() {
        assert_eq!(
            verification_message(&["customer CUST-002", "order ORD-006"]),
            "Seed verification failed for: customer CUST-002, order ORD-006"
        );
        assert_eq!(verification_message(&[]), "Some sample data failed to load");
    }

    #[test]
    fn summary_reports_new_rows() {
        let message = summary(SeedResult { customers_inserted: 0, orders_inserted: 2 });

        assert_eq!(
            message,
            "sample dataset present: 5 customers and 8 orders (0 new customers, 2 new orders)"
        );
    }
}
