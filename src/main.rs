// SPDX-License-Identifier: MIT

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::ArgMatches;
use defaults_edit::{
    Backend, CollisionPolicy, Domain, DomainSession, PlistPath, PlistType,
    PreferenceStore, Recents, StoreConfig, build_cli, is_expandable, view,
    prettifier::{apple_style_string, render_outline},
    recents::{self, DEFAULT_LIMIT},
    store,
};

fn main() {
    env_logger::init();
    let matches = build_cli().get_matches();

    let result = match matches.subcommand() {
        Some((cmd, sub_m)) => handle_subcommand(cmd, sub_m),
        None => Ok(()),
    };
    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn store_config(sub_m: &ArgMatches) -> Result<StoreConfig> {
    let mut config = StoreConfig::default();
    if let Some(backend) = sub_m.get_one::<String>("backend") {
        config.backend = backend.parse::<Backend>()?;
    }
    if let Some(program) = sub_m.get_one::<String>("defaults-program") {
        config.defaults_program = PathBuf::from(program);
    }
    Ok(config)
}

fn required<'a>(sub_m: &'a ArgMatches, name: &str) -> Result<&'a str> {
    sub_m
        .get_one::<String>(name)
        .map(String::as_str)
        .with_context(|| format!("{name} required"))
}

fn node_path(sub_m: &ArgMatches) -> Result<PlistPath> {
    match sub_m.get_one::<String>("path") {
        Some(path) => Ok(path.parse()?),
        None => Ok(PlistPath::root()),
    }
}

/// Opens the domain named on the command line and records it as recently used.
fn open_session(sub_m: &ArgMatches) -> Result<DomainSession<impl PreferenceStore>> {
    let domain = Domain::parse(required(sub_m, "domain")?);
    let config = store_config(sub_m)?;
    let store = store::open(domain.clone(), &config)
        .with_context(|| format!("could not open domain {domain}"))?;
    remember(domain);
    Ok(DomainSession::new(store))
}

fn remember(domain: Domain) {
    let saved = recents::default_path()
        .and_then(|path| Recents::load(path, DEFAULT_LIMIT))
        .and_then(|mut recents| {
            recents.add(domain);
            recents.save()
        });
    if let Err(e) = saved {
        log::warn!("could not update recent domains: {e}");
    }
}

fn handle_subcommand(cmd: &str, sub_m: &ArgMatches) -> Result<()> {
    match cmd {
        "show" => {
            let session = open_session(sub_m)?;
            let path = node_path(sub_m)?;
            let filter = sub_m.get_one::<String>("filter").map(String::as_str);
            let top = if sub_m.get_flag("all") {
                let global = store::open(Domain::Global, &store_config(sub_m)?)
                    .context("could not open the global domain")?;
                session.visible(&global, None)?
            } else {
                session.tree()?
            };
            let tree = view(&top, &path, filter)?;
            if sub_m.get_flag("outline") && is_expandable(&tree) {
                print!("{}", render_outline(&tree));
            } else {
                println!("{}", apple_style_string(&tree, 0));
            }
        }
        "type" => {
            let session = open_session(sub_m)?;
            let path = node_path(sub_m)?;
            println!("Type is {}", session.type_at(&path)?);
        }
        "set" => {
            let mut session = open_session(sub_m)?;
            let path = node_path(sub_m)?;
            let text = required(sub_m, "value")?;
            let declared = sub_m
                .get_one::<String>("type")
                .map(|t| t.parse::<PlistType>())
                .transpose()?;
            session.set(&path, declared, text)?;
            println!("OK");
        }
        "rename" => {
            let mut session = open_session(sub_m)?;
            let path = node_path(sub_m)?;
            let mut item = session.item_at(&path)?;
            item.set_key(required(sub_m, "new_key")?);
            let policy = if sub_m.get_flag("force") {
                CollisionPolicy::Overwrite
            } else {
                CollisionPolicy::Reject
            };
            session.commit(&path, item, policy)?;
            println!("OK");
        }
        "retype" => {
            let mut session = open_session(sub_m)?;
            let path = node_path(sub_m)?;
            let kind: PlistType = required(sub_m, "type")?.parse()?;
            let mut item = session.item_at(&path)?;
            item.set_type(kind);
            session.commit(&path, item, CollisionPolicy::Reject)?;
            println!("OK");
        }
        "delete" => {
            let mut session = open_session(sub_m)?;
            let paths = sub_m
                .get_many::<String>("path")
                .into_iter()
                .flatten()
                .map(|p| p.parse::<PlistPath>())
                .collect::<Result<Vec<_>, _>>()?;
            session.remove(&paths)?;
            println!("OK");
        }
        "domains" => {
            let config = store_config(sub_m)?;
            for domain in store::list_domains(&config.defaults_program)? {
                println!("{domain}");
            }
        }
        "recents" => {
            let mut recents = Recents::load(recents::default_path()?, DEFAULT_LIMIT)?;
            if sub_m.get_flag("clear") {
                recents.clear();
                recents.save()?;
                println!("OK");
            } else {
                for domain in recents.iter() {
                    println!("{domain}");
                }
            }
        }
        other => bail!("unknown subcommand {other}"),
    }
    Ok(())
}
