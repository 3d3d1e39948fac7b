use std::sync::{Mutex, MutexGuard};

use super::domain::{
    Applicant, ApplicantId, Application, ApplicationFilter, ApplicationId, Scheme, SchemeId,
};
use super::repository::{AssistanceRepository, RepositoryError};

#[derive(Debug, Default)]
struct StoreState {
    applicants: Vec<Applicant>,
    schemes: Vec<Scheme>,
    applications: Vec<Application>,
}

impl StoreState {
    fn check_references(&self, application: &Application) -> Result<(), RepositoryError> {
        if !self
            .applicants
            .iter()
            .any(|applicant| applicant.id == application.applicant_id)
        {
            return Err(RepositoryError::MissingApplicant);
        }
        if !self
            .schemes
            .iter()
            .any(|scheme| scheme.id == application.scheme_id)
        {
            return Err(RepositoryError::MissingScheme);
        }
        Ok(())
    }

    fn duplicate_pair(&self, candidate: &Application) -> bool {
        self.applications.iter().any(|existing| {
            existing.id != candidate.id
                && existing.applicant_id == candidate.applicant_id
                && existing.scheme_id == candidate.scheme_id
        })
    }
}

/// Process-local store. One lock guards every collection, so each call is atomic.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    state: Mutex<StoreState>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, StoreState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store lock poisoned".to_string()))
    }
}

fn replace_by<T, F>(items: &mut [T], item: T, same: F) -> Result<(), RepositoryError>
where
    F: Fn(&T, &T) -> bool,
{
    let slot = items
        .iter_mut()
        .find(|existing| same(existing, &item))
        .ok_or(RepositoryError::NotFound)?;
    *slot = item;
    Ok(())
}

impl AssistanceRepository for InMemoryRepository {
    fn insert_applicant(&self, applicant: Applicant) -> Result<Applicant, RepositoryError> {
        let mut state = self.state()?;
        if state.applicants.iter().any(|existing| existing.id == applicant.id) {
            return Err(RepositoryError::Conflict);
        }
        state.applicants.push(applicant.clone());
        Ok(applicant)
    }

    fn replace_applicant(&self, applicant: Applicant) -> Result<Applicant, RepositoryError> {
        let mut state = self.state()?;
        replace_by(&mut state.applicants, applicant.clone(), |a, b| a.id == b.id)?;
        Ok(applicant)
    }

    fn fetch_applicant(&self, id: &ApplicantId) -> Result<Option<Applicant>, RepositoryError> {
        let state = self.state()?;
        Ok(state.applicants.iter().find(|applicant| applicant.id == *id).cloned())
    }

    fn list_applicants(&self) -> Result<Vec<Applicant>, RepositoryError> {
        Ok(self.state()?.applicants.clone())
    }

    fn delete_applicant(&self, id: &ApplicantId) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        let before = state.applicants.len();
        state.applicants.retain(|applicant| applicant.id != *id);
        if state.applicants.len() == before {
            return Err(RepositoryError::NotFound);
        }
        state
            .applications
            .retain(|application| application.applicant_id != *id);
        Ok(())
    }

    fn insert_scheme(&self, scheme: Scheme) -> Result<Scheme, RepositoryError> {
        let mut state = self.state()?;
        if state.schemes.iter().any(|existing| existing.id == scheme.id) {
            return Err(RepositoryError::Conflict);
        }
        state.schemes.push(scheme.clone());
        Ok(scheme)
    }

    fn replace_scheme(&self, scheme: Scheme) -> Result<Scheme, RepositoryError> {
        let mut state = self.state()?;
        replace_by(&mut state.schemes, scheme.clone(), |a, b| a.id == b.id)?;
        Ok(scheme)
    }

    fn fetch_scheme(&self, id: &SchemeId) -> Result<Option<Scheme>, RepositoryError> {
        let state = self.state()?;
        Ok(state.schemes.iter().find(|scheme| scheme.id == *id).cloned())
    }

    fn list_schemes(&self) -> Result<Vec<Scheme>, RepositoryError> {
        Ok(self.state()?.schemes.clone())
    }

    fn delete_scheme(&self, id: &SchemeId) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        let before = state.schemes.len();
        state.schemes.retain(|scheme| scheme.id != *id);
        if state.schemes.len() == before {
            return Err(RepositoryError::NotFound);
        }
        state
            .applications
            .retain(|application| application.scheme_id != *id);
        Ok(())
    }

    fn insert_application(
        &self,
        application: Application,
    ) -> Result<Application, RepositoryError> {
        let mut state = self.state()?;
        state.check_references(&application)?;
        if state.duplicate_pair(&application)
            || state
                .applications
                .iter()
                .any(|existing| existing.id == application.id)
        {
            return Err(RepositoryError::Conflict);
        }
        state.applications.push(application.clone());
        Ok(application)
    }

    fn replace_application(
        &self,
        application: Application,
    ) -> Result<Application, RepositoryError> {
        let mut state = self.state()?;
        if !state
            .applications
            .iter()
            .any(|existing| existing.id == application.id)
        {
            return Err(RepositoryError::NotFound);
        }
        state.check_references(&application)?;
        if state.duplicate_pair(&application) {
            return Err(RepositoryError::Conflict);
        }
        replace_by(&mut state.applications, application.clone(), |a, b| {
            a.id == b.id
        })?;
        Ok(application)
    }

    fn fetch_application(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<Application>, RepositoryError> {
        let state = self.state()?;
        Ok(state
            .applications
            .iter()
            .find(|application| application.id == *id)
            .cloned())
    }

    fn find_applications(
        &self,
        filter: &ApplicationFilter,
    ) -> Result<Vec<Application>, RepositoryError> {
        let state = self.state()?;
        Ok(state
            .applications
            .iter()
            .filter(|application| filter.matches(application))
            .cloned()
            .collect())
    }

    fn delete_application(&self, id: &ApplicationId) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        let before = state.applications.len();
        state.applications.retain(|application| application.id != *id);
        if state.applications.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    fn delete_applications_for(&self, applicant_id: &ApplicantId) -> Result<usize, RepositoryError> {
        let mut state = self.state()?;
        let before = state.applications.len();
        state
            .applications
            .retain(|application| application.applicant_id != *applicant_id);
        Ok(before - state.applications.len())
    }
}
