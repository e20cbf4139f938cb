use crate::callbacks::Messages;
use crate::error::Result;
use crate::log_prob::{virtual_dense, virtual_flat};
use crate::mode::LogDensityMode;
use crate::model::VirtualModel;
use ndarray::{Array1, ArrayView1};
use std::borrow::Cow;

/// Caller-owned output buffer for a gradient.
pub trait GradientBuffer: Default {
    /// Replaces the contents with `values`, resizing as needed.
    fn overwrite(&mut self, values: &[f64]);

    /// Current contents as a flat slice, if contiguous.
    fn as_flat(&self) -> Cow<'_, [f64]>;
}

impl GradientBuffer for Vec<f64> {
    fn overwrite(&mut self, values: &[f64]) {
        self.clear();
        self.extend_from_slice(values);
    }

    fn as_flat(&self) -> Cow<'_, [f64]> {
        Cow::Borrowed(self.as_slice())
    }
}

impl GradientBuffer for Array1<f64> {
    fn overwrite(&mut self, values: &[f64]) {
        if self.len() != values.len() {
            *self = Array1::zeros(values.len());
        }
        self.assign(&ArrayView1::from(values));
    }

    fn as_flat(&self) -> Cow<'_, [f64]> {
        match self.as_slice() {
            Some(s) => Cow::Borrowed(s),
            None => Cow::Owned(self.to_vec()),
        }
    }
}

/// A parameter container the evaluators accept: flat (`Vec<f64>`, `[f64]`)
/// or dense (`Array1<f64>`).
///
/// The container decides which of a [`VirtualModel`]'s flat or dense entry
/// points is called, and which buffer type receives the gradient.
pub trait ParamVector {
    type Gradient: GradientBuffer;

    /// Parameter values as one contiguous slice.
    fn as_flat(&self) -> Cow<'_, [f64]>;

    fn virtual_log_prob<M: VirtualModel + ?Sized>(
        &self,
        model: &M,
        mode: LogDensityMode,
        msgs: &mut Messages<'_>,
    ) -> Result<f64>;

    fn virtual_log_prob_grad<M: VirtualModel + ?Sized>(
        &self,
        model: &M,
        gradient: &mut Self::Gradient,
        mode: LogDensityMode,
        msgs: &mut Messages<'_>,
    ) -> Result<f64>;
}

impl ParamVector for [f64] {
    type Gradient = Vec<f64>;

    fn as_flat(&self) -> Cow<'_, [f64]> {
        Cow::Borrowed(self)
    }

    fn virtual_log_prob<M: VirtualModel + ?Sized>(
        &self,
        model: &M,
        mode: LogDensityMode,
        msgs: &mut Messages<'_>,
    ) -> Result<f64> {
        virtual_flat(model, self, mode, msgs)
    }

    fn virtual_log_prob_grad<M: VirtualModel + ?Sized>(
        &self,
        model: &M,
        gradient: &mut Vec<f64>,
        mode: LogDensityMode,
        msgs: &mut Messages<'_>,
    ) -> Result<f64> {
        model.log_prob_grad(self, gradient, mode.propto, mode.jacobian, msgs)
    }
}

impl ParamVector for Vec<f64> {
    type Gradient = Vec<f64>;

    fn as_flat(&self) -> Cow<'_, [f64]> {
        Cow::Borrowed(self.as_slice())
    }

    fn virtual_log_prob<M: VirtualModel + ?Sized>(
        &self,
        model: &M,
        mode: LogDensityMode,
        msgs: &mut Messages<'_>,
    ) -> Result<f64> {
        self.as_slice().virtual_log_prob(model, mode, msgs)
    }

    fn virtual_log_prob_grad<M: VirtualModel + ?Sized>(
        &self,
        model: &M,
        gradient: &mut Vec<f64>,
        mode: LogDensityMode,
        msgs: &mut Messages<'_>,
    ) -> Result<f64> {
        self.as_slice()
            .virtual_log_prob_grad(model, gradient, mode, msgs)
    }
}

impl ParamVector for Array1<f64> {
    type Gradient = Array1<f64>;

    fn as_flat(&self) -> Cow<'_, [f64]> {
        GradientBuffer::as_flat(self)
    }

    fn virtual_log_prob<M: VirtualModel + ?Sized>(
        &self,
        model: &M,
        mode: LogDensityMode,
        msgs: &mut Messages<'_>,
    ) -> Result<f64> {
        virtual_dense(model, self, mode, msgs)
    }

    fn virtual_log_prob_grad<M: VirtualModel + ?Sized>(
        &self,
        model: &M,
        gradient: &mut Array1<f64>,
        mode: LogDensityMode,
        msgs: &mut Messages<'_>,
    ) -> Result<f64> {
        model.log_prob_grad_dense(self, gradient, mode.propto, mode.jacobian, msgs)
    }
}
