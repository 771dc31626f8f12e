//
// Copyright (c) The Setline Core Contributors
//
// SPDX-License-Identifier: MIT
//

use derive_new::new;
use itertools::Itertools;
use serde::Serialize;
use setline_utils::SET_VERB;
use setline_utils::session::ConfigSession;

use crate::config::Config;
use crate::debug::Debug;
use crate::delete::render_delete;
use crate::error::{Error, ExistenceError};
use crate::existence;
use crate::identity::Identity;
use crate::parse::Parser;
use crate::render::render;
use crate::resource::{Resource, set_prefix};
use crate::tree::Node;
use crate::validate::validate;

/// Lifecycle state of a configuration object.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectState {
    Planned,
    Created,
    Present,
    Updated,
    Deleted,
    // The object may or may not exist on the device.
    Inconsistent,
}

#[derive(Clone, Debug, new)]
pub struct Object {
    pub identity: Identity,
    pub state: ObjectState,
    pub config: Node,
}

/// Runs object lifecycle operations over a device session.
///
/// The session must be held exclusively for the lifetime of the driver
/// (see `SessionLock`). Each mutating operation sends a single transaction;
/// whenever loading or committing it fails the candidate configuration is
/// discarded.
#[derive(Debug)]
pub struct Driver<'a, S: ConfigSession> {
    session: &'a mut S,
    config: &'a Config,
}

// ===== impl ObjectState =====

impl ObjectState {
    pub fn can_transition(self, to: ObjectState) -> bool {
        use ObjectState::*;

        matches!(
            (self, to),
            (Planned, Created)
                | (Planned, Present)
                | (Created, Present)
                | (Present, Present)
                | (Present, Updated)
                | (Updated, Present)
                | (Present | Updated | Inconsistent, Deleted)
                | (Inconsistent, Present)
                | (Planned | Created | Present | Updated, Inconsistent)
        )
    }
}

impl std::fmt::Display for ObjectState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ObjectState::Planned => write!(f, "planned"),
            ObjectState::Created => write!(f, "created"),
            ObjectState::Present => write!(f, "present"),
            ObjectState::Updated => write!(f, "updated"),
            ObjectState::Deleted => write!(f, "deleted"),
            ObjectState::Inconsistent => write!(f, "inconsistent"),
        }
    }
}

// ===== impl Object =====

impl Object {
    fn transition(
        &mut self,
        address: &str,
        state: ObjectState,
    ) -> Result<(), Error> {
        if !self.state.can_transition(state) {
            return Err(Error::InvalidTransition(self.state, state));
        }
        Debug::StateTransition(address, self.state, state).log();
        self.state = state;
        Ok(())
    }

    fn expect_state(
        &self,
        expected: &[ObjectState],
        next: ObjectState,
    ) -> Result<(), Error> {
        if !expected.contains(&self.state) {
            return Err(Error::InvalidTransition(self.state, next));
        }
        Ok(())
    }
}

// ===== impl Driver =====

impl<'a, S> Driver<'a, S>
where
    S: ConfigSession,
{
    pub fn new(session: &'a mut S, config: &'a Config) -> Driver<'a, S> {
        Driver { session, config }
    }

    // Validates the desired configuration of an object.
    pub fn plan<R: Resource>(&self, tree: &Node) -> Result<Object, Error> {
        let violations = validate(R::schema(), tree)?;
        if !violations.is_empty() {
            return Err(Error::Validation(violations));
        }
        let identity = Identity::from_tree(R::keys(), tree)?;

        Ok(Object::new(identity, ObjectState::Planned, tree.clone()))
    }

    pub fn create<R: Resource>(
        &mut self,
        object: &mut Object,
    ) -> Result<(), Error> {
        object.expect_state(&[ObjectState::Planned], ObjectState::Created)?;

        let address = R::address(&object.identity);
        self.check_dependencies::<R>(&object.identity, &address)?;
        if self.exists(&address)? {
            return Err(ExistenceError::AlreadyExists(address).into());
        }

        let lines = self.object_lines::<R>(&address, &object.config)?;
        let comment = self.comment::<R>("create");
        self.apply(&lines, &comment)?;

        self.verify_present(object, &address)?;
        object.transition(&address, ObjectState::Created)?;
        self.read_back::<R>(object, &address)
    }

    // Reads the current configuration of an object, if it exists.
    pub fn read<R: Resource>(
        &mut self,
        identity: &Identity,
    ) -> Result<Option<Node>, Error> {
        let address = R::address(identity);
        let lines = existence::read_lines(
            &mut *self.session,
            &self.config.framing,
            &address,
        )?;
        Debug::ExistenceCheck(&address, !lines.is_empty()).log();
        if lines.is_empty() {
            return Ok(None);
        }

        let mut seed = Node::new();
        identity.apply(&mut seed);
        let parser = Parser::new(R::schema())
            .with_framing(self.config.framing.clone());
        parser.parse_lines(seed, lines).map(Some)
    }

    // Re-reads an object; a vanished object becomes deleted.
    pub fn refresh<R: Resource>(
        &mut self,
        object: &mut Object,
    ) -> Result<(), Error> {
        let address = R::address(&object.identity);
        match self.read::<R>(&object.identity)? {
            Some(tree) => {
                object.transition(&address, ObjectState::Present)?;
                object.config = tree;
            }
            None => object.transition(&address, ObjectState::Deleted)?,
        }

        Ok(())
    }

    // Replaces the configuration of an object in a single transaction.
    //
    // A change of key fields moves the object to a new address, which must
    // be free.
    pub fn update<R: Resource>(
        &mut self,
        object: &mut Object,
        tree: &Node,
    ) -> Result<(), Error> {
        object.expect_state(&[ObjectState::Present], ObjectState::Updated)?;

        let violations = validate(R::schema(), tree)?;
        if !violations.is_empty() {
            return Err(Error::Validation(violations));
        }
        let identity = Identity::from_tree(R::keys(), tree)?;
        let old_address = R::address(&object.identity);
        let address = R::address(&identity);
        if identity != object.identity {
            self.check_dependencies::<R>(&identity, &address)?;
            if self.exists(&address)? {
                return Err(ExistenceError::AlreadyExists(address).into());
            }
        }

        let mut lines = render_delete(&old_address);
        lines.extend(self.object_lines::<R>(&address, tree)?);
        let comment = self.comment::<R>("update");
        self.apply(&lines, &comment)?;

        object.transition(&address, ObjectState::Updated)?;
        object.identity = identity;
        object.config = tree.clone();
        self.verify_present(object, &address)?;
        self.read_back::<R>(object, &address)
    }

    // Deletes an object. Deleting an absent object is not an error.
    pub fn delete<R: Resource>(
        &mut self,
        object: &mut Object,
    ) -> Result<(), Error> {
        let address = R::address(&object.identity);
        object.expect_state(
            &[
                ObjectState::Present,
                ObjectState::Updated,
                ObjectState::Inconsistent,
            ],
            ObjectState::Deleted,
        )?;

        let lines = render_delete(&address);
        let comment = self.comment::<R>("delete");
        self.apply(&lines, &comment)?;

        if self.config.commit.verify && self.exists(&address)? {
            object.transition(&address, ObjectState::Inconsistent)?;
            return Err(ExistenceError::PresentAfterDelete(address).into());
        }
        object.transition(&address, ObjectState::Deleted)
    }

    // Adopts an object that already exists on the device.
    pub fn import<R: Resource>(&mut self, id: &str) -> Result<Object, Error> {
        let identity = Identity::parse(R::keys(), id)?;
        let address = R::address(&identity);
        let tree = self
            .read::<R>(&identity)?
            .ok_or_else(|| ExistenceError::NotFound(address.clone()))?;

        let mut object = Object::new(identity, ObjectState::Planned, tree);
        object.transition(&address, ObjectState::Present)?;

        Ok(object)
    }

    fn exists(&mut self, address: &str) -> Result<bool, Error> {
        existence::exists(&mut *self.session, &self.config.framing, address)
    }

    fn check_dependencies<R: Resource>(
        &mut self,
        identity: &Identity,
        address: &str,
    ) -> Result<(), Error> {
        if !self.config.checks.dependencies {
            return Ok(());
        }
        for dependency in R::dependencies(identity) {
            if !self.exists(&dependency)? {
                return Err(ExistenceError::MissingDependency(
                    address.to_owned(),
                    dependency,
                )
                .into());
            }
        }

        Ok(())
    }

    // Full line set of an object: the bare address followed by one line per
    // configured value.
    fn object_lines<R: Resource>(
        &self,
        address: &str,
        tree: &Node,
    ) -> Result<Vec<String>, Error> {
        let mut lines = vec![format!("{SET_VERB} {address}")];
        lines.extend(render(R::schema(), tree, &set_prefix(address))?);
        Ok(lines)
    }

    fn comment<R: Resource>(&self, action: &str) -> String {
        [
            self.config.commit.comment_prefix.as_str(),
            action,
            "resource",
            R::TYPE_NAME,
        ]
        .iter()
        .filter(|word| !word.is_empty())
        .join(" ")
    }

    fn apply(&mut self, lines: &[String], comment: &str) -> Result<(), Error> {
        if let Err(error) = self.session.config_set(lines) {
            self.discard("failed to load configuration");
            return Err(error.into());
        }
        Debug::Commit(comment, lines.len()).log();
        if let Err(error) = self.session.commit(comment) {
            self.discard("failed to commit configuration");
            return Err(error.into());
        }

        Ok(())
    }

    fn discard(&mut self, reason: &str) {
        Debug::CandidateDiscard(reason).log();
        if let Err(error) = self.session.config_clear() {
            error.log();
        }
    }

    fn verify_present(
        &mut self,
        object: &mut Object,
        address: &str,
    ) -> Result<(), Error> {
        if self.config.commit.verify && !self.exists(address)? {
            object.transition(address, ObjectState::Inconsistent)?;
            let error = ExistenceError::MissingAfterCommit(address.to_owned());
            return Err(error.into());
        }

        Ok(())
    }

    // Reads a committed object back. Finding nothing means the device
    // dropped it, whether or not the existence check ran.
    fn read_back<R: Resource>(
        &mut self,
        object: &mut Object,
        address: &str,
    ) -> Result<(), Error> {
        let Some(tree) = self.read::<R>(&object.identity)? else {
            object.transition(address, ObjectState::Inconsistent)?;
            let error = ExistenceError::MissingAfterCommit(address.to_owned());
            return Err(error.into());
        };
        object.config = tree;
        object.transition(address, ObjectState::Present)
    }
}
