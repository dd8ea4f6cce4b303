use anyhow::{anyhow, Result};
use clap::{crate_version, App, AppSettings, Arg, ArgMatches, SubCommand};
use std::path::{Path, PathBuf};
use tagweights::build::build_site;
use tagweights::config::Config;
use tagweights::context::BuildContext;
use tagweights::parser::Parser;

fn main() -> Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .init();

    let project_arg = Arg::with_name("project")
        .help("The project directory (or any directory below it)")
        .default_value(".")
        .index(1);

    let matches = App::new("tagweights")
        .version(crate_version!())
        .about("Generates tag pages and tag-cloud weights for a static site")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("build")
                .about("Renders one page per tag into the output directory")
                .arg(project_arg.clone())
                .arg(
                    Arg::with_name("output")
                        .help("The output directory (default: `build` next to tags.yaml)")
                        .short("o")
                        .long("output")
                        .takes_value(true),
                ),
        )
        .subcommand(
            SubCommand::with_name("weights")
                .about("Prints the count and weights of every tag")
                .arg(project_arg),
        )
        .get_matches();

    match matches.subcommand() {
        ("build", Some(matches)) => build(matches),
        ("weights", Some(matches)) => weights(matches),
        (name, _) => Err(anyhow!("unknown subcommand `{}`", name)),
    }
}

fn load_config(matches: &ArgMatches) -> Result<Config> {
    let project = Path::new(matches.value_of("project").unwrap_or("."));
    let output = matches.value_of("output").map(PathBuf::from);
    Ok(Config::from_directory(project, output.as_deref())?)
}

fn build(matches: &ArgMatches) -> Result<()> {
    let config = load_config(matches)?;
    let summary = build_site(&config)?;
    log::info!(
        "{} tags, {} pages written",
        summary.tags,
        summary.written.len()
    );
    Ok(())
}

fn weights(matches: &ArgMatches) -> Result<()> {
    let config = load_config(matches)?;
    let posts = Parser::new(&config.content_directory).parse_posts()?;
    let context = BuildContext::new(&posts, &config.tags);
    let cloud = &config.cloud;

    println!(
        "{:24} {:>6} {:>8} {:>8}  {}",
        "TAG", "COUNT", "LINEAR", "LOG", "GROUP"
    );
    for (tag, weight) in context.tagweights() {
        println!(
            "{:24} {:>6} {:>8.3} {:>8.3}  {}",
            tag,
            weight.count(),
            weight.linear(cloud.lower, cloud.upper),
            weight.log(cloud.lower, cloud.upper),
            cloud.group(weight).unwrap_or("-"),
        );
    }
    Ok(())
}
