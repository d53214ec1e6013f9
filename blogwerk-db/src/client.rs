use crate::record::{
    CommentRecord, FollowRecord, GroupRecord, PostRecord, TokenRecord, UserRecord,
};
use blogwerk_common::model::{
    Id, ModelValidationError,
    auth::{AuthSession, TokenHash, TokenTtl},
    comment::{Comment, CommentDraft, CommentMarker},
    follow::{Follow, FollowMarker, FollowRequest},
    group::{Group, GroupMarker},
    post::{Post, PostDraft, PostMarker},
    user::{User, UserMarker, Username},
};
use sqlx::{
    PgPool,
    postgres::PgPoolOptions,
};
use thiserror::Error;
use time::OffsetDateTime;

pub type Result<T, E = DbError> = std::result::Result<T, E>;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

#[derive(Debug, Error)]
pub enum DbError {
    #[error("An object in the database was invalid: {0}")]
    Data(#[from] ModelValidationError),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error("Running database migrations failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// A limit/offset window into a listing.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug)]
pub struct DbClient {
    pool: PgPool,
}

impl DbClient {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(16)
            .connect(database_url)
            .await?;

        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> Result<()> {
        MIGRATOR.run(&self.pool).await?;
        Ok(())
    }

    pub async fn create_user(&self, username: &Username, staff: bool) -> Result<Id<UserMarker>> {
        let user_id = sqlx::query_scalar::<_, i64>(
            "
            INSERT INTO users (username, is_staff)
            VALUES ($1, $2)
            RETURNING user_id
            ",
        )
        .bind(username.get())
        .bind(staff)
        .fetch_one(&self.pool)
        .await?;

        Ok(user_id.into())
    }

    pub async fn fetch_user(&self, user_id: Id<UserMarker>) -> Result<Option<User>> {
        let record = sqlx::query_as::<_, UserRecord>(
            "
            SELECT
                u.user_id,
                u.username,
                COALESCE(
                    ARRAY_AGG(p.post_id ORDER BY p.post_id)
                        FILTER (WHERE p.post_id IS NOT NULL),
                    ARRAY[]::BIGINT[]
                ) AS post_ids
            FROM users u
                LEFT JOIN posts p ON p.author_id = u.user_id
            WHERE u.user_id = $1
            GROUP BY u.user_id, u.username
            ",
        )
        .bind(user_id.get())
        .fetch_optional(&self.pool)
        .await?;

        let user = record.map(User::try_from).transpose()?;
        Ok(user)
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        let records = sqlx::query_as::<_, UserRecord>(
            "
            SELECT
                u.user_id,
                u.username,
                COALESCE(
                    ARRAY_AGG(p.post_id ORDER BY p.post_id)
                        FILTER (WHERE p.post_id IS NOT NULL),
                    ARRAY[]::BIGINT[]
                ) AS post_ids
            FROM users u
                LEFT JOIN posts p ON p.author_id = u.user_id
            GROUP BY u.user_id, u.username
            ORDER BY u.user_id
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        let users = records
            .into_iter()
            .map(User::try_from)
            .collect::<Result<_, _>>()?;
        Ok(users)
    }

    pub async fn fetch_user_id_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<Id<UserMarker>>> {
        let user_id = sqlx::query_scalar::<_, i64>(
            "
            SELECT user_id
            FROM users
            WHERE username = $1
            ",
        )
        .bind(username.get())
        .fetch_optional(&self.pool)
        .await?;

        Ok(user_id.map(Id::new))
    }

    pub async fn fetch_group(&self, group_id: Id<GroupMarker>) -> Result<Option<Group>> {
        let record = sqlx::query_as::<_, GroupRecord>(
            "
            SELECT group_id, title, slug, description
            FROM groups
            WHERE group_id = $1
            ",
        )
        .bind(group_id.get())
        .fetch_optional(&self.pool)
        .await?;

        let group = record.map(Group::try_from).transpose()?;
        Ok(group)
    }

    pub async fn list_groups(&self, page: Page) -> Result<Vec<Group>> {
        let records = sqlx::query_as::<_, GroupRecord>(
            "
            SELECT group_id, title, slug, description
            FROM groups
            ORDER BY group_id
            LIMIT $1 OFFSET $2
            ",
        )
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        let groups = records
            .into_iter()
            .map(Group::try_from)
            .collect::<Result<_, _>>()?;
        Ok(groups)
    }

    pub async fn count_groups(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM groups")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    pub async fn fetch_post(&self, post_id: Id<PostMarker>) -> Result<Option<Post>> {
        let record = sqlx::query_as::<_, PostRecord>(
            "
            SELECT
                p.post_id,
                u.username AS author_username,
                p.body,
                p.published_at,
                p.image,
                p.group_id
            FROM posts p
                JOIN users u ON u.user_id = p.author_id
            WHERE p.post_id = $1
            ",
        )
        .bind(post_id.get())
        .fetch_optional(&self.pool)
        .await?;

        let post = record.map(Post::try_from).transpose()?;
        Ok(post)
    }

    pub async fn list_posts(&self, page: Page) -> Result<Vec<Post>> {
        let records = sqlx::query_as::<_, PostRecord>(
            "
            SELECT
                p.post_id,
                u.username AS author_username,
                p.body,
                p.published_at,
                p.image,
                p.group_id
            FROM posts p
                JOIN users u ON u.user_id = p.author_id
            ORDER BY p.published_at DESC, p.post_id DESC
            LIMIT $1 OFFSET $2
            ",
        )
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        let posts = records
            .into_iter()
            .map(Post::try_from)
            .collect::<Result<_, _>>()?;
        Ok(posts)
    }

    pub async fn count_posts(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    pub async fn create_post(
        &self,
        author: Id<UserMarker>,
        author_username: &Username,
        draft: &PostDraft,
    ) -> Result<Post> {
        let (post_id, published_at) = sqlx::query_as::<_, (i64, OffsetDateTime)>(
            "
            INSERT INTO posts (author_id, body, image, group_id)
            VALUES ($1, $2, $3, $4)
            RETURNING post_id, published_at
            ",
        )
        .bind(author.get())
        .bind(&draft.text)
        .bind(draft.image.as_deref())
        .bind(draft.group.map(Id::get))
        .fetch_one(&self.pool)
        .await?;

        Ok(Post {
            id: post_id.into(),
            author: author_username.clone(),
            text: draft.text.clone(),
            pub_date: published_at,
            image: draft.image.clone(),
            group: draft.group,
        })
    }

    pub async fn update_post(
        &self,
        post_id: Id<PostMarker>,
        text: &str,
        image: Option<&str>,
        group: Option<Id<GroupMarker>>,
    ) -> Result<Option<Post>> {
        let record = sqlx::query_as::<_, PostRecord>(
            "
            UPDATE posts p
            SET body = $2, image = $3, group_id = $4
            FROM users u
            WHERE p.post_id = $1 AND u.user_id = p.author_id
            RETURNING
                p.post_id,
                u.username AS author_username,
                p.body,
                p.published_at,
                p.image,
                p.group_id
            ",
        )
        .bind(post_id.get())
        .bind(text)
        .bind(image)
        .bind(group.map(Id::get))
        .fetch_optional(&self.pool)
        .await?;

        let post = record.map(Post::try_from).transpose()?;
        Ok(post)
    }

    pub async fn delete_post(&self, post_id: Id<PostMarker>) -> Result<bool> {
        let affected = sqlx::query("DELETE FROM posts WHERE post_id = $1")
            .bind(post_id.get())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(affected > 0)
    }

    pub async fn fetch_comment(
        &self,
        post_id: Id<PostMarker>,
        comment_id: Id<CommentMarker>,
    ) -> Result<Option<Comment>> {
        let record = sqlx::query_as::<_, CommentRecord>(
            "
            SELECT
                c.comment_id,
                u.username AS author_username,
                c.post_id,
                c.body,
                c.created_at
            FROM comments c
                JOIN users u ON u.user_id = c.author_id
            WHERE c.post_id = $1 AND c.comment_id = $2
            ",
        )
        .bind(post_id.get())
        .bind(comment_id.get())
        .fetch_optional(&self.pool)
        .await?;

        let comment = record.map(Comment::try_from).transpose()?;
        Ok(comment)
    }

    pub async fn list_comments(
        &self,
        post_id: Id<PostMarker>,
        page: Page,
    ) -> Result<Vec<Comment>> {
        let records = sqlx::query_as::<_, CommentRecord>(
            "
            SELECT
                c.comment_id,
                u.username AS author_username,
                c.post_id,
                c.body,
                c.created_at
            FROM comments c
                JOIN users u ON u.user_id = c.author_id
            WHERE c.post_id = $1
            ORDER BY c.created_at, c.comment_id
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(post_id.get())
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        let comments = records
            .into_iter()
            .map(Comment::try_from)
            .collect::<Result<_, _>>()?;
        Ok(comments)
    }

    pub async fn count_comments(&self, post_id: Id<PostMarker>) -> Result<i64> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comments WHERE post_id = $1")
                .bind(post_id.get())
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    pub async fn create_comment(
        &self,
        post_id: Id<PostMarker>,
        author: Id<UserMarker>,
        author_username: &Username,
        draft: &CommentDraft,
    ) -> Result<Comment> {
        let (comment_id, created_at) = sqlx::query_as::<_, (i64, OffsetDateTime)>(
            "
            INSERT INTO comments (post_id, author_id, body)
            VALUES ($1, $2, $3)
            RETURNING comment_id, created_at
            ",
        )
        .bind(post_id.get())
        .bind(author.get())
        .bind(&draft.text)
        .fetch_one(&self.pool)
        .await?;

        Ok(Comment {
            id: comment_id.into(),
            author: author_username.clone(),
            post: post_id,
            text: draft.text.clone(),
            created: created_at,
        })
    }

    pub async fn update_comment(
        &self,
        post_id: Id<PostMarker>,
        comment_id: Id<CommentMarker>,
        text: &str,
    ) -> Result<Option<Comment>> {
        let record = sqlx::query_as::<_, CommentRecord>(
            "
            UPDATE comments c
            SET body = $3
            FROM users u
            WHERE c.post_id = $1 AND c.comment_id = $2 AND u.user_id = c.author_id
            RETURNING
                c.comment_id,
                u.username AS author_username,
                c.post_id,
                c.body,
                c.created_at
            ",
        )
        .bind(post_id.get())
        .bind(comment_id.get())
        .bind(text)
        .fetch_optional(&self.pool)
        .await?;

        let comment = record.map(Comment::try_from).transpose()?;
        Ok(comment)
    }

    pub async fn delete_comment(
        &self,
        post_id: Id<PostMarker>,
        comment_id: Id<CommentMarker>,
    ) -> Result<bool> {
        let affected =
            sqlx::query("DELETE FROM comments WHERE post_id = $1 AND comment_id = $2")
                .bind(post_id.get())
                .bind(comment_id.get())
                .execute(&self.pool)
                .await?
                .rows_affected();

        Ok(affected > 0)
    }

    pub async fn follow_exists(&self, request: &FollowRequest) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "
            SELECT EXISTS (
                SELECT 1 FROM follows
                WHERE follower_id = $1 AND followee_id = $2
            )
            ",
        )
        .bind(request.follower().get())
        .bind(request.followee().get())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Inserts the edge, returning `None` when it already exists. The unique
    /// constraint decides races between concurrent identical inserts.
    pub async fn create_follow(
        &self,
        request: &FollowRequest,
    ) -> Result<Option<Id<FollowMarker>>> {
        let follow_id = sqlx::query_scalar::<_, i64>(
            "
            INSERT INTO follows (follower_id, followee_id)
            VALUES ($1, $2)
            ON CONFLICT (follower_id, followee_id) DO NOTHING
            RETURNING follow_id
            ",
        )
        .bind(request.follower().get())
        .bind(request.followee().get())
        .fetch_optional(&self.pool)
        .await?;

        Ok(follow_id.map(Id::new))
    }

    pub async fn list_follows(
        &self,
        follower: Id<UserMarker>,
        search: Option<&str>,
        page: Page,
    ) -> Result<Vec<Follow>> {
        let records = sqlx::query_as::<_, FollowRecord>(
            "
            SELECT
                f.follow_id,
                fu.username AS follower_username,
                gu.username AS followee_username
            FROM follows f
                JOIN users fu ON fu.user_id = f.follower_id
                JOIN users gu ON gu.user_id = f.followee_id
            WHERE f.follower_id = $1
                AND ($2::TEXT IS NULL OR gu.username = $2 OR fu.username = $2)
            ORDER BY f.follow_id
            LIMIT $3 OFFSET $4
            ",
        )
        .bind(follower.get())
        .bind(search)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        let follows = records
            .into_iter()
            .map(Follow::try_from)
            .collect::<Result<_, _>>()?;
        Ok(follows)
    }

    pub async fn count_follows(
        &self,
        follower: Id<UserMarker>,
        search: Option<&str>,
    ) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "
            SELECT COUNT(*)
            FROM follows f
                JOIN users fu ON fu.user_id = f.follower_id
                JOIN users gu ON gu.user_id = f.followee_id
            WHERE f.follower_id = $1
                AND ($2::TEXT IS NULL OR gu.username = $2 OR fu.username = $2)
            ",
        )
        .bind(follower.get())
        .bind(search)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    pub async fn create_token(
        &self,
        user_id: Id<UserMarker>,
        token_hash: &TokenHash,
        ttl: Option<TokenTtl>,
    ) -> Result<()> {
        let expires_at = ttl.map(|ttl| OffsetDateTime::now_utc() + ttl.get());

        sqlx::query(
            "
            INSERT INTO api_tokens (token_hash, user_id, expires_at)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(token_hash.as_bytes())
        .bind(user_id.get())
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn fetch_auth(&self, token_hash: &TokenHash) -> Result<Option<AuthSession>> {
        let record = sqlx::query_as::<_, TokenRecord>(
            "
            SELECT t.user_id, u.username, u.is_staff, t.expires_at
            FROM api_tokens t
                JOIN users u ON u.user_id = t.user_id
            WHERE t.token_hash = $1
            ",
        )
        .bind(token_hash.as_bytes())
        .fetch_optional(&self.pool)
        .await?;

        let session = record.map(AuthSession::try_from).transpose()?;
        Ok(session)
    }
}
