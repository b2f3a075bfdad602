use std::sync::Arc;

use anyhow::Context;
use blogicum_server::application::taxonomy_service::TaxonomyService;
use blogicum_server::data::taxonomy_repository::PostgresTaxonomyRepository;
use blogicum_server::domain::category::NewCategory;
use blogicum_server::domain::location::NewLocation;
use blogicum_server::infrastructure::config::database_url;
use blogicum_server::infrastructure::database::{create_pool, run_migrations};
use blogicum_server::infrastructure::logging::init_cli_logging;
use clap::{Parser, Subcommand};

/// Manages the categories and locations authors pick from.
#[derive(Parser, Debug)]
#[clap(name = "blogicum-admin")]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[clap(subcommand)]
    Category(CategoryCommand),
    #[clap(subcommand)]
    Location(LocationCommand),
}

#[derive(Subcommand, Debug)]
enum CategoryCommand {
    Add {
        #[clap(long)]
        title: String,
        #[clap(long)]
        slug: String,
        #[clap(long, default_value = "")]
        description: String,
        /// Create the category unpublished.
        #[clap(long)]
        hidden: bool,
    },
    Publish {
        slug: String,
    },
    Hide {
        slug: String,
    },
    Delete {
        slug: String,
    },
    List,
}

#[derive(Subcommand, Debug)]
enum LocationCommand {
    Add {
        #[clap(long)]
        name: String,
        #[clap(long)]
        hidden: bool,
    },
    Delete {
        id: i64,
    },
    List,
}

fn published_mark(is_published: bool) -> &'static str {
    if is_published { "published" } else { "hidden" }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_cli_logging();
    let args = Cli::parse();

    let pool = create_pool(&database_url()?)
        .await
        .context("failed to connect to database")?;
    run_migrations(&pool)
        .await
        .context("failed to run migrations")?;
    let taxonomy = TaxonomyService::new(Arc::new(PostgresTaxonomyRepository::new(pool)));

    match args.command {
        Command::Category(command) => match command {
            CategoryCommand::Add {
                title,
                slug,
                description,
                hidden,
            } => {
                let category = taxonomy
                    .create_category(NewCategory {
                        title,
                        description,
                        slug,
                        is_published: !hidden,
                    })
                    .await?;
                println!("Category created! ID: {} slug: {}", category.id, category.slug);
            }
            CategoryCommand::Publish { slug } => {
                taxonomy.set_category_published(&slug, true).await?;
                println!("Category {} published", slug);
            }
            CategoryCommand::Hide { slug } => {
                taxonomy.set_category_published(&slug, false).await?;
                println!("Category {} hidden", slug);
            }
            CategoryCommand::Delete { slug } => {
                taxonomy.delete_category(&slug).await?;
                println!("Category {} deleted, its posts keep no category", slug);
            }
            CategoryCommand::List => {
                let categories = taxonomy.categories().await?;
                println!("Categories ({})", categories.len());
                for category in categories {
                    println!(
                        "- [{}] {} ({}) {}",
                        category.id,
                        category.title,
                        category.slug,
                        published_mark(category.is_published)
                    );
                }
            }
        },
        Command::Location(command) => match command {
            LocationCommand::Add { name, hidden } => {
                let location = taxonomy
                    .create_location(NewLocation {
                        name,
                        is_published: !hidden,
                    })
                    .await?;
                println!("Location created! ID: {}", location.id);
            }
            LocationCommand::Delete { id } => {
                taxonomy.delete_location(id).await?;
                println!("Location {} deleted", id);
            }
            LocationCommand::List => {
                let locations = taxonomy.locations().await?;
                println!("Locations ({})", locations.len());
                for location in locations {
                    println!(
                        "- [{}] {} {}",
                        location.id,
                        location.name,
                        published_mark(location.is_published)
                    );
                }
            }
        },
    }

    Ok(())
}
