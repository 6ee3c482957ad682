//! `SwSimd` adapters: a portable lane-array engine and the x86_64 SSE2/AVX2
//! engines for i8 and i16 lanes.

use std::marker::PhantomData;

use super::kernel::SwSimd;
use super::precision::ScoreElem;

/// Lane-array engine built from plain scalar loops.
///
/// Runs on every target; on non-x86_64 hosts it stands in for the 128-bit
/// engines.
#[derive(Copy, Clone)]
pub struct PortableEngine<T, const N: usize>(PhantomData<T>);

impl<T: ScoreElem, const N: usize> PortableEngine<T, N> {
    #[inline(always)]
    fn zip(a: [T; N], b: [T; N], f: impl Fn(T, T) -> T) -> [T; N] {
        let mut out = a;
        for i in 0..N {
            out[i] = f(a[i], b[i]);
        }
        out
    }

    #[inline(always)]
    fn mask(c: bool) -> T {
        if c { T::from_i32(-1) } else { T::default() }
    }
}

impl<T: ScoreElem, const N: usize> SwSimd for PortableEngine<T, N> {
    type Elem = T;
    type V = [T; N];
    const LANES: usize = N;

    #[inline(always)]
    unsafe fn setzero() -> Self::V {
        [T::default(); N]
    }
    #[inline(always)]
    unsafe fn set1(x: T) -> Self::V {
        [x; N]
    }
    #[inline(always)]
    unsafe fn loadu(ptr: *const T) -> Self::V {
        unsafe { std::ptr::read_unaligned(ptr as *const [T; N]) }
    }
    #[inline(always)]
    unsafe fn storeu(ptr: *mut T, v: Self::V) {
        unsafe { std::ptr::write_unaligned(ptr as *mut [T; N], v) }
    }
    #[inline(always)]
    unsafe fn add(a: Self::V, b: Self::V) -> Self::V {
        Self::zip(a, b, T::wrapping_add)
    }
    #[inline(always)]
    unsafe fn sub(a: Self::V, b: Self::V) -> Self::V {
        Self::zip(a, b, T::wrapping_sub)
    }
    #[inline(always)]
    unsafe fn max(a: Self::V, b: Self::V) -> Self::V {
        Self::zip(a, b, |x, y| if x > y { x } else { y })
    }
    #[inline(always)]
    unsafe fn min(a: Self::V, b: Self::V) -> Self::V {
        Self::zip(a, b, |x, y| if x < y { x } else { y })
    }
    #[inline(always)]
    unsafe fn cmpeq(a: Self::V, b: Self::V) -> Self::V {
        Self::zip(a, b, |x, y| Self::mask(x == y))
    }
    #[inline(always)]
    unsafe fn cmpgt(a: Self::V, b: Self::V) -> Self::V {
        Self::zip(a, b, |x, y| Self::mask(x > y))
    }
    #[inline(always)]
    unsafe fn blendv(a: Self::V, b: Self::V, mask: Self::V) -> Self::V {
        let mut out = a;
        for i in 0..N {
            if mask[i] < T::default() {
                out[i] = b[i];
            }
        }
        out
    }
    #[inline(always)]
    unsafe fn and(a: Self::V, b: Self::V) -> Self::V {
        Self::zip(a, b, |x, y| x & y)
    }
    #[inline(always)]
    unsafe fn or(a: Self::V, b: Self::V) -> Self::V {
        Self::zip(a, b, |x, y| x | y)
    }
    #[inline(always)]
    unsafe fn andnot(a: Self::V, b: Self::V) -> Self::V {
        Self::zip(a, b, |x, y| !x & y)
    }
    #[inline(always)]
    unsafe fn any(mask: Self::V) -> bool {
        mask.iter().any(|&m| m != T::default())
    }
    #[inline(always)]
    unsafe fn all(mask: Self::V) -> bool {
        mask.iter().all(|&m| m != T::default())
    }
}

#[cfg(target_arch = "x86_64")]
pub use self::x86::{SwEngine128, SwEngine128I16, SwEngine256, SwEngine256I16};

#[cfg(target_arch = "x86_64")]
mod x86 {
    use std::arch::x86_64::*;

    use super::SwSimd;

    /// SSE2 128-bit engine adapter (16 lanes of i8)
    ///
    /// SSE2 has no signed byte max/min or byte blend; they are built from
    /// compares and bit selects.
    #[derive(Copy, Clone)]
    pub struct SwEngine128;

    #[inline(always)]
    unsafe fn select128(a: __m128i, b: __m128i, mask: __m128i) -> __m128i {
        unsafe { _mm_or_si128(_mm_and_si128(mask, b), _mm_andnot_si128(mask, a)) }
    }

    impl SwSimd for SwEngine128 {
        type Elem = i8;
        type V = __m128i;
        const LANES: usize = 16;

        #[inline(always)]
        unsafe fn setzero() -> Self::V {
            unsafe { _mm_setzero_si128() }
        }
        #[inline(always)]
        unsafe fn set1(x: i8) -> Self::V {
            unsafe { _mm_set1_epi8(x) }
        }
        #[inline(always)]
        unsafe fn loadu(ptr: *const i8) -> Self::V {
            unsafe { _mm_loadu_si128(ptr as *const __m128i) }
        }
        #[inline(always)]
        unsafe fn storeu(ptr: *mut i8, v: Self::V) {
            unsafe { _mm_storeu_si128(ptr as *mut __m128i, v) }
        }
        #[inline(always)]
        unsafe fn add(a: Self::V, b: Self::V) -> Self::V {
            unsafe { _mm_add_epi8(a, b) }
        }
        #[inline(always)]
        unsafe fn sub(a: Self::V, b: Self::V) -> Self::V {
            unsafe { _mm_sub_epi8(a, b) }
        }
        #[inline(always)]
        unsafe fn max(a: Self::V, b: Self::V) -> Self::V {
            unsafe { select128(b, a, _mm_cmpgt_epi8(a, b)) }
        }
        #[inline(always)]
        unsafe fn min(a: Self::V, b: Self::V) -> Self::V {
            unsafe { select128(a, b, _mm_cmpgt_epi8(a, b)) }
        }
        #[inline(always)]
        unsafe fn cmpeq(a: Self::V, b: Self::V) -> Self::V {
            unsafe { _mm_cmpeq_epi8(a, b) }
        }
        #[inline(always)]
        unsafe fn cmpgt(a: Self::V, b: Self::V) -> Self::V {
            unsafe { _mm_cmpgt_epi8(a, b) }
        }
        #[inline(always)]
        unsafe fn blendv(a: Self::V, b: Self::V, mask: Self::V) -> Self::V {
            unsafe { select128(a, b, mask) }
        }
        #[inline(always)]
        unsafe fn and(a: Self::V, b: Self::V) -> Self::V {
            unsafe { _mm_and_si128(a, b) }
        }
        #[inline(always)]
        unsafe fn or(a: Self::V, b: Self::V) -> Self::V {
            unsafe { _mm_or_si128(a, b) }
        }
        #[inline(always)]
        unsafe fn andnot(a: Self::V, b: Self::V) -> Self::V {
            unsafe { _mm_andnot_si128(a, b) }
        }
        #[inline(always)]
        unsafe fn any(mask: Self::V) -> bool {
            unsafe { _mm_movemask_epi8(mask) != 0 }
        }
        #[inline(always)]
        unsafe fn all(mask: Self::V) -> bool {
            unsafe { _mm_movemask_epi8(mask) == 0xFFFF }
        }
    }

    /// SSE2 128-bit engine adapter (8 lanes of i16)
    #[derive(Copy, Clone)]
    pub struct SwEngine128I16;

    impl SwSimd for SwEngine128I16 {
        type Elem = i16;
        type V = __m128i;
        const LANES: usize = 8;

        #[inline(always)]
        unsafe fn setzero() -> Self::V {
            unsafe { _mm_setzero_si128() }
        }
        #[inline(always)]
        unsafe fn set1(x: i16) -> Self::V {
            unsafe { _mm_set1_epi16(x) }
        }
        #[inline(always)]
        unsafe fn loadu(ptr: *const i16) -> Self::V {
            unsafe { _mm_loadu_si128(ptr as *const __m128i) }
        }
        #[inline(always)]
        unsafe fn storeu(ptr: *mut i16, v: Self::V) {
            unsafe { _mm_storeu_si128(ptr as *mut __m128i, v) }
        }
        #[inline(always)]
        unsafe fn add(a: Self::V, b: Self::V) -> Self::V {
            unsafe { _mm_add_epi16(a, b) }
        }
        #[inline(always)]
        unsafe fn sub(a: Self::V, b: Self::V) -> Self::V {
            unsafe { _mm_sub_epi16(a, b) }
        }
        #[inline(always)]
        unsafe fn max(a: Self::V, b: Self::V) -> Self::V {
            unsafe { _mm_max_epi16(a, b) }
        }
        #[inline(always)]
        unsafe fn min(a: Self::V, b: Self::V) -> Self::V {
            unsafe { _mm_min_epi16(a, b) }
        }
        #[inline(always)]
        unsafe fn cmpeq(a: Self::V, b: Self::V) -> Self::V {
            unsafe { _mm_cmpeq_epi16(a, b) }
        }
        #[inline(always)]
        unsafe fn cmpgt(a: Self::V, b: Self::V) -> Self::V {
            unsafe { _mm_cmpgt_epi16(a, b) }
        }
        #[inline(always)]
        unsafe fn blendv(a: Self::V, b: Self::V, mask: Self::V) -> Self::V {
            unsafe { select128(a, b, mask) }
        }
        #[inline(always)]
        unsafe fn and(a: Self::V, b: Self::V) -> Self::V {
            unsafe { _mm_and_si128(a, b) }
        }
        #[inline(always)]
        unsafe fn or(a: Self::V, b: Self::V) -> Self::V {
            unsafe { _mm_or_si128(a, b) }
        }
        #[inline(always)]
        unsafe fn andnot(a: Self::V, b: Self::V) -> Self::V {
            unsafe { _mm_andnot_si128(a, b) }
        }
        #[inline(always)]
        unsafe fn any(mask: Self::V) -> bool {
            unsafe { _mm_movemask_epi8(mask) != 0 }
        }
        #[inline(always)]
        unsafe fn all(mask: Self::V) -> bool {
            unsafe { _mm_movemask_epi8(mask) == 0xFFFF }
        }
    }

    /// AVX2 256-bit engine adapter (32 lanes of i8)
    #[derive(Copy, Clone)]
    pub struct SwEngine256;

    impl SwSimd for SwEngine256 {
        type Elem = i8;
        type V = __m256i;
        const LANES: usize = 32;

        #[inline(always)]
        unsafe fn setzero() -> Self::V {
            unsafe { _mm256_setzero_si256() }
        }
        #[inline(always)]
        unsafe fn set1(x: i8) -> Self::V {
            unsafe { _mm256_set1_epi8(x) }
        }
        #[inline(always)]
        unsafe fn loadu(ptr: *const i8) -> Self::V {
            unsafe { _mm256_loadu_si256(ptr as *const __m256i) }
        }
        #[inline(always)]
        unsafe fn storeu(ptr: *mut i8, v: Self::V) {
            unsafe { _mm256_storeu_si256(ptr as *mut __m256i, v) }
        }
        #[inline(always)]
        unsafe fn add(a: Self::V, b: Self::V) -> Self::V {
            unsafe { _mm256_add_epi8(a, b) }
        }
        #[inline(always)]
        unsafe fn sub(a: Self::V, b: Self::V) -> Self::V {
            unsafe { _mm256_sub_epi8(a, b) }
        }
        #[inline(always)]
        unsafe fn max(a: Self::V, b: Self::V) -> Self::V {
            unsafe { _mm256_max_epi8(a, b) }
        }
        #[inline(always)]
        unsafe fn min(a: Self::V, b: Self::V) -> Self::V {
            unsafe { _mm256_min_epi8(a, b) }
        }
        #[inline(always)]
        unsafe fn cmpeq(a: Self::V, b: Self::V) -> Self::V {
            unsafe { _mm256_cmpeq_epi8(a, b) }
        }
        #[inline(always)]
        unsafe fn cmpgt(a: Self::V, b: Self::V) -> Self::V {
            unsafe { _mm256_cmpgt_epi8(a, b) }
        }
        #[inline(always)]
        unsafe fn blendv(a: Self::V, b: Self::V, mask: Self::V) -> Self::V {
            unsafe { _mm256_blendv_epi8(a, b, mask) }
        }
        #[inline(always)]
        unsafe fn and(a: Self::V, b: Self::V) -> Self::V {
            unsafe { _mm256_and_si256(a, b) }
        }
        #[inline(always)]
        unsafe fn or(a: Self::V, b: Self::V) -> Self::V {
            unsafe { _mm256_or_si256(a, b) }
        }
        #[inline(always)]
        unsafe fn andnot(a: Self::V, b: Self::V) -> Self::V {
            unsafe { _mm256_andnot_si256(a, b) }
        }
        #[inline(always)]
        unsafe fn any(mask: Self::V) -> bool {
            unsafe { _mm256_movemask_epi8(mask) != 0 }
        }
        #[inline(always)]
        unsafe fn all(mask: Self::V) -> bool {
            unsafe { _mm256_movemask_epi8(mask) == -1 }
        }
    }

    /// AVX2 256-bit engine adapter (16 lanes of i16)
    #[derive(Copy, Clone)]
    pub struct SwEngine256I16;

    impl SwSimd for SwEngine256I16 {
        type Elem = i16;
        type V = __m256i;
        const LANES: usize = 16;

        #[inline(always)]
        unsafe fn setzero() -> Self::V {
            unsafe { _mm256_setzero_si256() }
        }
        #[inline(always)]
        unsafe fn set1(x: i16) -> Self::V {
            unsafe { _mm256_set1_epi16(x) }
        }
        #[inline(always)]
        unsafe fn loadu(ptr: *const i16) -> Self::V {
            unsafe { _mm256_loadu_si256(ptr as *const __m256i) }
        }
        #[inline(always)]
        unsafe fn storeu(ptr: *mut i16, v: Self::V) {
            unsafe { _mm256_storeu_si256(ptr as *mut __m256i, v) }
        }
        #[inline(always)]
        unsafe fn add(a: Self::V, b: Self::V) -> Self::V {
            unsafe { _mm256_add_epi16(a, b) }
        }
        #[inline(always)]
        unsafe fn sub(a: Self::V, b: Self::V) -> Self::V {
            unsafe { _mm256_sub_epi16(a, b) }
        }
        #[inline(always)]
        unsafe fn max(a: Self::V, b: Self::V) -> Self::V {
            unsafe { _mm256_max_epi16(a, b) }
        }
        #[inline(always)]
        unsafe fn min(a: Self::V, b: Self::V) -> Self::V {
            unsafe { _mm256_min_epi16(a, b) }
        }
        #[inline(always)]
        unsafe fn cmpeq(a: Self::V, b: Self::V) -> Self::V {
            unsafe { _mm256_cmpeq_epi16(a, b) }
        }
        #[inline(always)]
        unsafe fn cmpgt(a: Self::V, b: Self::V) -> Self::V {
            unsafe { _mm256_cmpgt_epi16(a, b) }
        }
        #[inline(always)]
        unsafe fn blendv(a: Self::V, b: Self::V, mask: Self::V) -> Self::V {
            unsafe { _mm256_blendv_epi8(a, b, mask) }
        }
        #[inline(always)]
        unsafe fn and(a: Self::V, b: Self::V) -> Self::V {
            unsafe { _mm256_and_si256(a, b) }
        }
        #[inline(always)]
        unsafe fn or(a: Self::V, b: Self::V) -> Self::V {
            unsafe { _mm256_or_si256(a, b) }
        }
        #[inline(always)]
        unsafe fn andnot(a: Self::V, b: Self::V) -> Self::V {
            unsafe { _mm256_andnot_si256(a, b) }
        }
        #[inline(always)]
        unsafe fn any(mask: Self::V) -> bool {
            unsafe { _mm256_movemask_epi8(mask) != 0 }
        }
        #[inline(always)]
        unsafe fn all(mask: Self::V) -> bool {
            unsafe { _mm256_movemask_epi8(mask) == -1 }
        }
    }
}
