use crate::{
    error::{Error, Warning},
    network::add_network,
    plan::{make_app_plan, make_system_plan, AppPlan, NoExtension, PhaseExtension, SystemPlan},
};
use daqflow_config::{Ident, Options, System};
use indexmap::IndexMap;
use log::info;
use serde::Serialize;

/// The plans produced for a system.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Generated {
    /// The command plan of each application, in declaration order.
    pub apps: IndexMap<Ident, AppPlan>,
    pub system: SystemPlan,
    #[serde(skip)]
    pub warnings: Vec<Warning>,
}

impl Generated {
    pub fn app(&self, name: &str) -> Option<&AppPlan> {
        self.apps.get(name)
    }
}

/// Runs the whole pipeline from a system to its command plans.
#[derive(Debug, Clone, Default)]
pub struct Generator<E = NoExtension> {
    options: Options,
    extension: E,
}

impl Generator<NoExtension> {
    pub fn new(options: Options) -> Self {
        Self {
            options,
            extension: NoExtension,
        }
    }
}

impl<E> Generator<E>
where
    E: PhaseExtension,
{
    /// Replace the provider of `pause` and `resume` commands.
    pub fn with_extension<X>(self, extension: X) -> Generator<X>
    where
        X: PhaseExtension,
    {
        Generator {
            options: self.options,
            extension,
        }
    }

    /// Generate the application and system plans.
    ///
    /// Network bridges are added to the system first, so the system is
    /// modified in place. The whole generation fails on the first error.
    pub fn generate(&self, system: &mut System) -> Result<Generated, Error> {
        info!("add network bridges");
        let warnings = add_network(system, &self.options)?;

        info!("build application plans");
        let apps: IndexMap<_, _> = system
            .apps
            .iter()
            .map(|(name, app)| -> Result<_, Error> {
                let plan = make_app_plan(name, &app.graph, &self.options, &self.extension)?;
                Ok((name.clone(), plan))
            })
            .collect::<Result<_, _>>()?;

        info!("build system plan");
        let system = make_system_plan(system, &self.options)?;

        Ok(Generated {
            apps,
            system,
            warnings,
        })
    }
}
